//! System endpoints: health check and store statistics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, MonitorError};
use crate::persistence::StoreStats;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /stats` — Row counts across the local store.
///
/// # Errors
///
/// Returns [`MonitorError::Persistence`] on database failure.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "System",
    summary = "Store statistics",
    description = "Returns row counts per table and the time range covered by summary snapshots.",
    responses(
        (status = 200, description = "Store statistics", body = StoreStats),
        (status = 500, description = "Database failure", body = ErrorResponse),
    )
)]
pub async fn stats_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, MonitorError> {
    Ok(Json(state.store.stats().await?))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// System routes mounted under /api/v1.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/stats", get(stats_handler))
}
