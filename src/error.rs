//! Monitor error types with HTTP status code mapping.
//!
//! [`MonitorError`] is the central error type for the monitor. The pipeline
//! uses it to report fatal cycle failures (retrieval, persistence) with the
//! offending pool's identity, the synchronizer uses it per remote call, and
//! the read API renders it as a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "pool not found: kz-01",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Monitor error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 5000–5999 | Upstream        | 502 Bad Gateway              |
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The observer page could not be loaded for a pool.
    #[error("[{pool_id}] page retrieval failed: {message}")]
    Retrieval {
        /// Pool whose page failed to load.
        pool_id: String,
        /// Underlying failure.
        message: String,
    },

    /// Local store failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Pool with the given ID is not registered.
    #[error("pool not found: {0}")]
    PoolNotFound(String),

    /// Pool exists but no scrape cycle has stored a summary for it yet.
    #[error("no snapshot yet for pool: {0}")]
    NoSnapshot(String),

    /// Pool with the given ID is already registered.
    #[error("pool already exists: {0}")]
    PoolAlreadyExists(String),

    /// Request or argument validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// A single remote store call failed.
    #[error("remote call to {table} failed: {message}")]
    Remote {
        /// Remote table the call targeted.
        table: String,
        /// Underlying failure.
        message: String,
    },

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Config(_) => 1002,
            Self::PoolNotFound(_) => 2001,
            Self::PoolAlreadyExists(_) => 2002,
            Self::NoSnapshot(_) => 2003,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Retrieval { .. } => 5001,
            Self::Remote { .. } => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Config(_) => StatusCode::BAD_REQUEST,
            Self::PoolNotFound(_) | Self::NoSnapshot(_) => StatusCode::NOT_FOUND,
            Self::PoolAlreadyExists(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Retrieval { .. } | Self::Remote { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Prefixes store and internal failures with the pool they hit, so that
    /// fatal cycle errors always name the pool. Other variants already do
    /// or do not belong to a pool.
    #[must_use]
    pub fn for_pool(self, pool_id: &str) -> Self {
        match self {
            Self::Persistence(msg) => Self::Persistence(format!("[{pool_id}] {msg}")),
            Self::Internal(msg) => Self::Internal(format!("[{pool_id}] {msg}")),
            other => other,
        }
    }
}

impl From<sqlx::Error> for MonitorError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for MonitorError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Persistence(format!("migration failed: {err}"))
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_error_names_the_pool() {
        let err = MonitorError::Retrieval {
            pool_id: "kz-01".to_string(),
            message: "timed out".to_string(),
        };
        assert_eq!(err.to_string(), "[kz-01] page retrieval failed: timed out");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn remote_errors_map_to_bad_gateway() {
        let err = MonitorError::Remote {
            table: "devices".to_string(),
            message: "503".to_string(),
        };
        assert_eq!(err.error_code(), 5002);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn store_failures_gain_the_pool_prefix() {
        let err = MonitorError::Persistence("disk I/O error".to_string()).for_pool("kz-01");
        assert_eq!(err.to_string(), "persistence error: [kz-01] disk I/O error");
        let err = MonitorError::PoolNotFound("kz-01".to_string()).for_pool("kz-01");
        assert_eq!(err.to_string(), "pool not found: kz-01");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = MonitorError::PoolNotFound("x".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn missing_snapshot_is_not_a_missing_pool() {
        let err = MonitorError::NoSnapshot("kz-01".to_string());
        assert_eq!(err.to_string(), "no snapshot yet for pool: kz-01");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2003);
    }
}
