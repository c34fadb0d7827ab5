//! Pool directory handlers: list, get, delete.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{DeletePoolResponse, ListPoolsQuery, PoolListResponse};
use crate::app_state::AppState;
use crate::domain::{PoolId, PoolRecord};
use crate::error::{ErrorResponse, MonitorError};

/// `GET /pools` — List registered pools.
///
/// # Errors
///
/// Returns [`MonitorError::Persistence`] on database failure.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns every registered pool ordered by id, optionally only the active ones.",
    params(ListPoolsQuery),
    responses(
        (status = 200, description = "Pool list", body = PoolListResponse),
        (status = 500, description = "Database failure", body = ErrorResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(query): Query<ListPoolsQuery>,
) -> Result<impl IntoResponse, MonitorError> {
    let data = state.store.list_pools(query.active_only).await?;
    Ok(Json(PoolListResponse {
        total: data.len(),
        data,
    }))
}

/// `GET /pools/{id}` — Get pool metadata.
///
/// # Errors
///
/// Returns [`MonitorError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get pool",
    description = "Returns the identity and descriptive metadata of one pool.",
    params(
        ("id" = String, Path, description = "Pool id"),
    ),
    responses(
        (status = 200, description = "Pool metadata", body = PoolRecord),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MonitorError> {
    let record = state.store.get_pool(&PoolId::new(id)).await?;
    Ok(Json(record))
}

/// `DELETE /pools/{id}` — Remove a pool and all of its data.
///
/// # Errors
///
/// Returns [`MonitorError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Delete a pool",
    description = "Removes the pool together with its snapshots, worker rows, earnings and anomalies, in one transaction.",
    params(
        ("id" = String, Path, description = "Pool id"),
    ),
    responses(
        (status = 200, description = "Pool deleted", body = DeletePoolResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn delete_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MonitorError> {
    let pool_id = PoolId::new(id);
    let rows_deleted = state.store.delete_pool(&pool_id).await?;
    Ok(Json(DeletePoolResponse {
        pool_id,
        rows_deleted,
    }))
}

/// Pool directory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools", get(list_pools))
        .route("/pools/{id}", get(get_pool).delete(delete_pool))
}
