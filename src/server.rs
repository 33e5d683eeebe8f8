use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::aggregates::{self, SeverityShare};
use crate::client::SecurityApi;
use crate::completeness::{self, CandidateProfile, CompletenessReport, VerificationRecord};
use crate::config::Config;
use crate::error::{AppError, SessionError};
use crate::events::{self, EventFilters, EventsPageState};
use crate::export::{self, ExportOutcome};
use crate::heatmap::HeatmapView;
use crate::metrics::Metrics;
use crate::models::{ExportRequest, TimeRange, TopIp};
use crate::refresh::{DashboardSlot, DashboardState, Refresher};
use crate::session::{Session, CONSOLE_ROLES};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: Arc<Session>,
    pub api: Arc<dyn SecurityApi>,
    pub refresher: Arc<Refresher>,
    pub events: Arc<RwLock<EventsPageState>>,
    pub metrics: Arc<Metrics>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Dashboard view-model
        .route("/api/console/dashboard", get(get_dashboard))
        .route("/api/console/dashboard/refresh", post(refresh_dashboard))
        .route("/api/console/dashboard/dismiss", post(dismiss_panel))
        // Events page view-model
        .route("/api/console/events", get(get_events))
        .route("/api/console/events/filters", put(apply_filters))
        .route("/api/console/events/clear", post(clear_filters))
        .route("/api/console/events/page/:page", post(set_page))
        .route("/api/console/events/:id/expand", post(toggle_row))
        // Heatmap and export
        .route("/api/console/heatmap", get(get_heatmap))
        .route("/api/console/export", post(run_export))
        // Candidate completeness
        .route("/api/console/completeness", post(evaluate_completeness))
        .route(
            "/api/console/completeness/dismiss",
            post(dismiss_completeness_prompt),
        )
        // Session
        .route("/api/console/logout", post(logout))
        // Metrics endpoint for Prometheus
        .route("/metrics", get(prometheus_metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn prometheus_metrics(State(state): State<AppState>) -> String {
    state.metrics.export_prometheus()
}

/// Dashboard snapshot plus the presentation aggregates derived from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub state: DashboardState,
    pub severity_shares: Vec<SeverityShare>,
    pub top_ips: Vec<TopIp>,
    pub next_refresh_secs: u32,
}

async fn dashboard_response(state: &AppState) -> DashboardResponse {
    let snapshot = state.refresher.snapshot().await;
    let severity_shares = snapshot
        .stats
        .as_ref()
        .map(|stats| aggregates::severity_shares(&stats.events_by_severity))
        .unwrap_or_default();
    let top_ips = snapshot
        .stats
        .as_ref()
        .map(aggregates::ranked_top_ips)
        .unwrap_or_default();

    DashboardResponse {
        severity_shares,
        top_ips,
        next_refresh_secs: state.refresher.seconds_until_refresh(),
        state: snapshot,
    }
}

async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    Ok(Json(dashboard_response(&state).await))
}

async fn refresh_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    state.refresher.manual_refresh().await;
    Ok(Json(dashboard_response(&state).await))
}

#[derive(Debug, Deserialize)]
struct DismissRequest {
    panel: DashboardSlot,
}

async fn dismiss_panel(
    State(state): State<AppState>,
    Json(request): Json<DismissRequest>,
) -> Result<StatusCode, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    state.refresher.dismiss(request.panel).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_events(State(state): State<AppState>) -> Result<Json<EventsPageState>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    Ok(Json(state.events.read().await.clone()))
}

async fn apply_filters(
    State(state): State<AppState>,
    Json(filters): Json<EventFilters>,
) -> Result<Json<EventsPageState>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    {
        state.events.write().await.apply_filters(filters);
    }
    events::reload(&state.events, state.api.as_ref()).await;
    Ok(Json(state.events.read().await.clone()))
}

async fn clear_filters(
    State(state): State<AppState>,
) -> Result<Json<EventsPageState>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    {
        state.events.write().await.clear();
    }
    events::reload(&state.events, state.api.as_ref()).await;
    Ok(Json(state.events.read().await.clone()))
}

async fn set_page(
    State(state): State<AppState>,
    Path(page): Path<u32>,
) -> Result<Json<EventsPageState>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    {
        state.events.write().await.set_page(page);
    }
    events::reload(&state.events, state.api.as_ref()).await;
    Ok(Json(state.events.read().await.clone()))
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    id: String,
    expanded: bool,
}

async fn toggle_row(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    let expanded = state.events.write().await.toggle_row(&id);
    Ok(Json(ToggleResponse { id, expanded }))
}

#[derive(Debug, Deserialize)]
struct HeatmapParams {
    range: Option<TimeRange>,
}

async fn get_heatmap(
    State(state): State<AppState>,
    Query(params): Query<HeatmapParams>,
) -> Result<Json<HeatmapView>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    let range = params.range.unwrap_or_default();
    let data = state.api.fetch_heatmap(range).await?;
    Ok(Json(HeatmapView::from_data(range, data)))
}

async fn run_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportOutcome>, AppError> {
    state.session.require_any(&CONSOLE_ROLES)?;
    let export_dir = PathBuf::from(&state.config.export_dir);
    let outcome = export::download(
        state.api.as_ref(),
        &request,
        &export_dir,
        &state.metrics,
    )
    .await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletenessRequest {
    verification: VerificationRecord,
    #[serde(default)]
    profile: Option<CandidateProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletenessResponse {
    report: CompletenessReport,
    show_completion_prompt: bool,
}

async fn evaluate_completeness(
    State(state): State<AppState>,
    Json(request): Json<CompletenessRequest>,
) -> Result<Json<CompletenessResponse>, AppError> {
    if !state.session.is_active() {
        return Err(AppError::Session(SessionError::Revoked));
    }
    let report = completeness::assess(&request.verification, request.profile.as_ref());
    let show_completion_prompt = completeness::completion_prompt_due(&state.session, &report);
    Ok(Json(CompletenessResponse {
        report,
        show_completion_prompt,
    }))
}

async fn dismiss_completeness_prompt(
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if !state.session.is_active() {
        return Err(AppError::Session(SessionError::Revoked));
    }
    completeness::dismiss_completion_prompt(&state.session);
    Ok(StatusCode::NO_CONTENT)
}

async fn logout(State(state): State<AppState>) -> StatusCode {
    state.session.logout();
    StatusCode::NO_CONTENT
}
