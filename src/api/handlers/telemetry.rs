//! Per-pool telemetry handlers: summary, workers, earnings, anomalies.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};

use crate::api::dto::{
    AnomaliesQuery, AnomaliesResponse, EarningsQuery, EarningsResponse, WorkersQuery,
    WorkersResponse,
};
use crate::app_state::AppState;
use crate::domain::PoolId;
use crate::error::{ErrorResponse, MonitorError};
use crate::normalize::parse_btc;
use crate::persistence::SnapshotRow;

/// Resolves the path id, failing with 404 for unknown pools.
async fn known_pool(state: &AppState, id: String) -> Result<PoolId, MonitorError> {
    let pool_id = PoolId::new(id);
    state.store.get_pool(&pool_id).await?;
    Ok(pool_id)
}

/// `GET /pools/{id}/summary` — Latest summary snapshot.
///
/// # Errors
///
/// Returns [`MonitorError::PoolNotFound`] if the pool does not exist, or
/// [`MonitorError::NoSnapshot`] if no cycle has stored a summary yet.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/summary",
    tag = "Telemetry",
    summary = "Latest summary",
    description = "Returns the most recent summary snapshot with display strings and normalized values.",
    params(
        ("id" = String, Path, description = "Pool id"),
    ),
    responses(
        (status = 200, description = "Latest snapshot", body = SnapshotRow),
        (status = 404, description = "Pool or snapshot not found", body = ErrorResponse),
    )
)]
pub async fn latest_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MonitorError> {
    let pool_id = known_pool(&state, id).await?;
    let snapshot = state
        .store
        .latest_snapshot(&pool_id)
        .await?
        .ok_or_else(|| MonitorError::NoSnapshot(pool_id.to_string()))?;
    Ok(Json(snapshot))
}

/// `GET /pools/{id}/workers` — Current worker set.
///
/// # Errors
///
/// Returns [`MonitorError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/workers",
    tag = "Telemetry",
    summary = "Current workers",
    description = "Returns the workers recorded by the pool's most recent cycle, optionally filtered by status.",
    params(
        ("id" = String, Path, description = "Pool id"),
        WorkersQuery,
    ),
    responses(
        (status = 200, description = "Current worker set", body = WorkersResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn current_workers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WorkersQuery>,
) -> Result<impl IntoResponse, MonitorError> {
    let pool_id = known_pool(&state, id).await?;
    let workers = state.store.current_workers(&pool_id, query.status).await?;
    let online = workers.iter().filter(|w| w.status == "ONLINE").count();
    Ok(Json(WorkersResponse {
        pool_id,
        timestamp: workers.first().map(|w| w.timestamp),
        online,
        offline: workers.len() - online,
        workers,
    }))
}

/// `GET /pools/{id}/earnings` — Most recent daily earnings.
///
/// # Errors
///
/// Returns [`MonitorError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/earnings",
    tag = "Telemetry",
    summary = "Recent earnings",
    description = "Returns the most recent daily earnings by date, plus the BTC total of those whose income parses.",
    params(
        ("id" = String, Path, description = "Pool id"),
        EarningsQuery,
    ),
    responses(
        (status = 200, description = "Recent earnings", body = EarningsResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn recent_earnings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EarningsQuery>,
) -> Result<impl IntoResponse, MonitorError> {
    let pool_id = known_pool(&state, id).await?;
    let earnings = state.store.recent_earnings(&pool_id, query.clamped()).await?;
    let total_btc = earnings.iter().filter_map(|e| parse_btc(&e.total_income)).sum();
    Ok(Json(EarningsResponse {
        pool_id,
        total_btc,
        earnings,
    }))
}

/// `GET /pools/{id}/anomalies` — Anomalies within a look-back window.
///
/// # Errors
///
/// Returns [`MonitorError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/anomalies",
    tag = "Telemetry",
    summary = "Recent anomalies",
    description = "Returns anomalies recorded within the last `hours` hours, newest first.",
    params(
        ("id" = String, Path, description = "Pool id"),
        AnomaliesQuery,
    ),
    responses(
        (status = 200, description = "Recent anomalies", body = AnomaliesResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn recent_anomalies(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AnomaliesQuery>,
) -> Result<impl IntoResponse, MonitorError> {
    let pool_id = known_pool(&state, id).await?;
    let hours = query.clamped();
    let since = Utc::now() - Duration::hours(i64::from(hours));
    let anomalies = state.store.anomalies_since(&pool_id, since).await?;
    Ok(Json(AnomaliesResponse {
        pool_id,
        hours,
        anomalies,
    }))
}

/// Telemetry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/summary", get(latest_summary))
        .route("/pools/{id}/workers", get(current_workers))
        .route("/pools/{id}/earnings", get(recent_earnings))
        .route("/pools/{id}/anomalies", get(recent_anomalies))
}
