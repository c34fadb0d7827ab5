//! Pool listing and deletion DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{PoolId, PoolRecord};

/// Query parameters for `GET /pools`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPoolsQuery {
    /// Only return pools that are scraped.
    #[serde(default)]
    pub active_only: bool,
}

/// Response body for `GET /pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    /// Pools ordered by id.
    pub data: Vec<PoolRecord>,
    /// Number of pools returned.
    pub total: usize,
}

/// Response body for `DELETE /pools/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletePoolResponse {
    /// Deleted pool.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Rows removed across all tables, the pool row included.
    pub rows_deleted: u64,
}
