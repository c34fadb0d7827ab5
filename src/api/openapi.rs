//! OpenAPI document and optional Swagger UI.

use axum::Router;
use utoipa::OpenApi;

use super::dto::{
    AnomaliesResponse, DeletePoolResponse, EarningsResponse, PoolListResponse, WorkersResponse,
};
use super::handlers::{pools, system, telemetry};
use crate::app_state::AppState;
use crate::domain::{PoolIdentity, PoolRecord, WorkerStatus};
use crate::error::{ErrorBody, ErrorResponse};
use crate::persistence::{AnomalyRow, EarningRow, SnapshotRow, StoreStats, WorkerRow};

/// OpenAPI description of the read API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "mining-pool-monitor", description = "Read API over scraped mining pool telemetry"),
    paths(
        system::health_handler,
        system::stats_handler,
        pools::list_pools,
        pools::get_pool,
        pools::delete_pool,
        telemetry::latest_summary,
        telemetry::current_workers,
        telemetry::recent_earnings,
        telemetry::recent_anomalies,
    ),
    components(schemas(
        system::HealthResponse,
        ErrorResponse,
        ErrorBody,
        PoolIdentity,
        PoolRecord,
        PoolListResponse,
        DeletePoolResponse,
        SnapshotRow,
        WorkerRow,
        WorkerStatus,
        EarningRow,
        AnomalyRow,
        StoreStats,
        WorkersResponse,
        EarningsResponse,
        AnomaliesResponse,
    )),
    tags(
        (name = "System", description = "Health and statistics"),
        (name = "Pools", description = "Pool directory"),
        (name = "Telemetry", description = "Scraped per-pool data"),
    )
)]
pub struct ApiDoc;

/// Serves the document at `/api-docs/openapi.json` and the UI at `/swagger-ui`.
#[cfg(feature = "swagger-ui")]
pub fn mount(router: Router<AppState>) -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;
    router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Serves the document at `/api-docs/openapi.json`.
#[cfg(not(feature = "swagger-ui"))]
pub fn mount(router: Router<AppState>) -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;
    router.route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/v1/stats",
            "/api/v1/pools",
            "/api/v1/pools/{id}",
            "/api/v1/pools/{id}/summary",
            "/api/v1/pools/{id}/workers",
            "/api/v1/pools/{id}/earnings",
            "/api/v1/pools/{id}/anomalies",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
