use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::*;

/// The backend security API this console polls. Behind a trait so the
/// scheduler and view-models can be exercised against a scripted fake.
#[async_trait]
pub trait SecurityApi: Send + Sync {
    async fn fetch_stats(&self) -> Result<DashboardStats, ApiError>;

    async fn fetch_events(&self, query: &EventQuery) -> Result<EventsPage, ApiError>;

    async fn fetch_heatmap(&self, range: TimeRange) -> Result<HeatmapData, ApiError>;

    async fn fetch_export(&self, request: &ExportRequest) -> Result<ExportDownload, ApiError>;
}

/// Raw export blob as returned by the backend.
#[derive(Debug, Clone)]
pub struct ExportDownload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// reqwest-backed implementation. Requests are credentialed: the cookie
/// store carries the platform session cookie across calls.
pub struct HttpSecurityApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSecurityApi {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(params).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl SecurityApi for HttpSecurityApi {
    async fn fetch_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("/stats", &[]).await
    }

    async fn fetch_events(&self, query: &EventQuery) -> Result<EventsPage, ApiError> {
        self.get_json("/events", &query.to_params()).await
    }

    async fn fetch_heatmap(&self, range: TimeRange) -> Result<HeatmapData, ApiError> {
        let now = chrono::Utc::now();
        let params = [
            ("startTime", range.start_from(now).to_rfc3339()),
            ("endTime", now.to_rfc3339()),
        ];
        self.get_json("/heatmap", &params).await
    }

    async fn fetch_export(&self, request: &ExportRequest) -> Result<ExportDownload, ApiError> {
        let url = format!("{}/export", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&request.to_params())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(ExportDownload {
            content_type,
            bytes,
        })
    }
}
