//! Security operations console core for the Talentgrid platform.
//!
//! Polls the platform's security REST API, maintains the dashboard
//! view-models (auto-refresh scheduling, event filtering, severity
//! derivations, heatmap binning, candidate completeness scoring), and serves
//! the derived state over a thin read-only JSON surface.

pub mod aggregates;
pub mod client;
pub mod completeness;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod heatmap;
pub mod metrics;
pub mod models;
pub mod refresh;
pub mod server;
pub mod session;
