// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Talentgrid Contributors

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use secops_console::client::{HttpSecurityApi, SecurityApi};
use secops_console::config::Config;
use secops_console::events::{self, EventsPageState};
use secops_console::metrics::Metrics;
use secops_console::refresh::Refresher;
use secops_console::server::{self, AppState};
use secops_console::session::{CurrentUser, Role, Session, CONSOLE_ROLES};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secops_console=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!("Loaded configuration");

    // The operator session is created once here and injected everywhere;
    // there is no ambient auth state.
    let role: Role = config.operator_role.parse()?;
    let session = Arc::new(Session::new(CurrentUser {
        id: Uuid::new_v4(),
        email: config.operator_email.clone(),
        role,
    }));
    session.require_any(&CONSOLE_ROLES)?;
    info!(
        email = %config.operator_email,
        role = role.label(),
        "Operator session established"
    );

    let metrics = Arc::new(Metrics::new());
    let api: Arc<dyn SecurityApi> = Arc::new(HttpSecurityApi::new(&config)?);

    let refresher = Arc::new(Refresher::new(
        api.clone(),
        metrics.clone(),
        config.refresh_interval_secs,
        config.recent_events_limit,
    ));
    let events_state = Arc::new(RwLock::new(EventsPageState::new(config.events_page_size)));

    // Prime both views before serving; failures surface as error panels,
    // never as startup aborts.
    refresher.refresh().await;
    events::reload(&events_state, api.as_ref()).await;

    // Start the auto-refresh ticker
    tokio::spawn(refresher.clone().run());

    let state = AppState {
        config: config.clone(),
        session,
        api,
        refresher,
        events: events_state,
        metrics,
    };

    let app = server::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting secops console on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
