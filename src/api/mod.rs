//! REST API layer: route handlers, DTOs, and router composition.
//!
//! The API is read-only apart from pool deletion. All resource endpoints
//! are mounted under `/api/v1`; `/health` sits at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Upper bound on handling one request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());
    openapi::mount(router)
}

/// Builds the served application: routes, middleware and state.
pub fn build_app(state: AppState) -> Router {
    build_router()
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{PoolId, PoolIdentity};
    use crate::persistence::SqliteStore;

    async fn app() -> Router {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("in-memory store failed");
        };
        build_app(AppState::new(store))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let Ok(request) = Request::builder().method(method).uri(uri).body(Body::empty()) else {
            panic!("bad request");
        };
        let Ok(response) = app().await.oneshot(request).await;
        response.status()
    }

    #[tokio::test]
    async fn health_is_at_the_root() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/api/v1/health").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_pool_is_not_found() {
        assert_eq!(status_of("GET", "/api/v1/pools/nope/summary").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of("DELETE", "/api/v1/pools/nope").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_directory_lists_nothing() {
        assert_eq!(status_of("GET", "/api/v1/pools").await, StatusCode::OK);
        assert_eq!(status_of("GET", "/api/v1/stats").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn registered_pool_without_snapshot() {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("in-memory store failed");
        };
        let identity = PoolIdentity {
            pool_id: PoolId::new("kz-01"),
            pool_name: "KZ 01".to_string(),
            observer_url: "https://observer.test/a".to_string(),
            client_name: String::new(),
            country: String::new(),
            company: String::new(),
            location: String::new(),
            contact_email: String::new(),
            tags: Vec::new(),
            active: true,
        };
        if let Err(e) = store.register_pool(&identity).await {
            panic!("register failed: {e}");
        }
        let Ok(request) = Request::builder()
            .uri("/api/v1/pools/kz-01/summary")
            .body(Body::empty())
        else {
            panic!("bad request");
        };
        let Ok(response) = build_app(AppState::new(store)).oneshot(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body not readable");
        };
        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("body not JSON");
        };
        assert_eq!(body["error"]["code"], 2003);
        assert_eq!(body["error"]["message"], "no snapshot yet for pool: kz-01");
    }

    #[tokio::test]
    async fn bad_status_filter_is_rejected() {
        assert_eq!(
            status_of("GET", "/api/v1/pools/kz-01/workers?status=DEGRADED").await,
            StatusCode::BAD_REQUEST
        );
    }
}
