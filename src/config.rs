use anyhow::Result;
use config::{Config as ConfigBuilder, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base_url: String,
    pub refresh_interval_secs: u32,
    pub events_page_size: u32,
    pub recent_events_limit: u32,
    pub request_timeout_secs: u64,
    pub export_dir: String,
    pub operator_email: String,
    pub operator_role: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = ConfigBuilder::builder()
            // Start with default values
            .set_default("port", 8090)?
            .set_default("api_base_url", "http://localhost:4000/api/security")?
            .set_default("refresh_interval_secs", 30)?
            .set_default("events_page_size", 50)?
            .set_default("recent_events_limit", 20)?
            .set_default("request_timeout_secs", 10)?
            .set_default("export_dir", "./exports")?
            .set_default("operator_email", "secops@talentgrid.local")?
            .set_default("operator_role", "security_ops")?
            // Add in settings from config file
            .add_source(File::with_name("config/console").required(false))
            // Add in settings from environment
            .add_source(Environment::with_prefix("CONSOLE"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
