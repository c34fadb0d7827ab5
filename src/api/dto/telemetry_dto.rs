//! DTOs for the per-pool telemetry endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{PoolId, WorkerStatus};
use crate::persistence::{AnomalyRow, EarningRow, WorkerRow};

/// Largest accepted `limit` for earnings.
pub const MAX_EARNINGS_LIMIT: usize = 365;

/// Largest accepted `hours` window for anomalies (30 days).
pub const MAX_ANOMALY_HOURS: u32 = 720;

/// Query parameters for `GET /pools/{id}/workers`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkersQuery {
    /// Only workers in this state.
    pub status: Option<WorkerStatus>,
}

/// Query parameters for `GET /pools/{id}/earnings`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EarningsQuery {
    /// Number of most recent days. Defaults to 7.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Query parameters for `GET /pools/{id}/anomalies`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnomaliesQuery {
    /// Look-back window in hours. Defaults to 24.
    #[serde(default = "default_hours")]
    pub hours: u32,
}

const fn default_limit() -> usize {
    7
}

const fn default_hours() -> u32 {
    24
}

impl EarningsQuery {
    /// Clamps `limit` to `1..=MAX_EARNINGS_LIMIT`.
    #[must_use]
    pub fn clamped(&self) -> usize {
        self.limit.clamp(1, MAX_EARNINGS_LIMIT)
    }
}

impl AnomaliesQuery {
    /// Clamps `hours` to `1..=MAX_ANOMALY_HOURS`.
    #[must_use]
    pub fn clamped(&self) -> u32 {
        self.hours.clamp(1, MAX_ANOMALY_HOURS)
    }
}

/// Response body for `GET /pools/{id}/workers`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WorkersResponse {
    /// Pool queried.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Cycle the worker set belongs to; `None` before the first cycle.
    pub timestamp: Option<DateTime<Utc>>,
    /// Online workers in the set (after filtering).
    pub online: usize,
    /// Offline workers in the set (after filtering).
    pub offline: usize,
    /// Worker rows.
    pub workers: Vec<WorkerRow>,
}

/// Response body for `GET /pools/{id}/earnings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EarningsResponse {
    /// Pool queried.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Sum of the parseable incomes, BTC.
    pub total_btc: f64,
    /// Earnings, most recent date first.
    pub earnings: Vec<EarningRow>,
}

/// Response body for `GET /pools/{id}/anomalies`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnomaliesResponse {
    /// Pool queried.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Look-back window applied.
    pub hours: u32,
    /// Anomalies, newest first.
    pub anomalies: Vec<AnomalyRow>,
}
