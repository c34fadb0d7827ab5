//! Database row models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{PoolId, PoolIdentity, PoolRecord};
use crate::error::MonitorError;

/// A row from `pool_metadata`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PoolMetadataRow {
    /// Stable key.
    pub pool_id: String,
    /// Display name.
    pub pool_name: String,
    /// Observer dashboard URL.
    pub observer_url: String,
    /// Client name.
    pub client_name: String,
    /// Country.
    pub country: String,
    /// Company.
    pub company: String,
    /// Location.
    pub location: String,
    /// Contact email.
    pub contact_email: String,
    /// Tags as a JSON array.
    pub tags: String,
    /// Active flag.
    pub active: bool,
    /// First registration time.
    pub created_at: DateTime<Utc>,
    /// Last metadata change.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PoolMetadataRow> for PoolRecord {
    type Error = MonitorError;

    fn try_from(row: PoolMetadataRow) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_str(&row.tags).map_err(|e| {
            MonitorError::Persistence(format!("pool {} has malformed tags: {e}", row.pool_id))
        })?;
        Ok(Self {
            identity: PoolIdentity {
                pool_id: PoolId::new(row.pool_id),
                pool_name: row.pool_name,
                observer_url: row.observer_url,
                client_name: row.client_name,
                country: row.country,
                company: row.company,
                location: row.location,
                contact_email: row.contact_email,
                tags,
                active: row.active,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from `pool_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct SnapshotRow {
    /// Row id.
    pub id: i64,
    /// Scrape time.
    pub timestamp: DateTime<Utc>,
    /// Owning pool.
    pub pool_id: String,
    /// Observer URL at scrape time.
    pub observer_url: String,
    /// Current hashrate as displayed.
    pub current_hashrate: String,
    /// Current hashrate, TH/s.
    pub current_hashrate_ths: f64,
    /// 24-hour average as displayed.
    pub avg_hashrate_24h: String,
    /// 24-hour average, TH/s.
    pub avg_hashrate_24h_ths: f64,
    /// Online workers.
    pub online_workers: i64,
    /// Offline workers.
    pub offline_workers: i64,
    /// Balance as displayed.
    pub balance: String,
    /// Balance in BTC, when parseable.
    pub balance_btc: Option<f64>,
    /// Last income as displayed.
    pub last_income: String,
    /// Last income in BTC, when parseable.
    pub last_income_btc: Option<f64>,
}

/// A row from `worker_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct WorkerRow {
    /// Row id.
    pub id: i64,
    /// Scrape time shared by all rows of one cycle.
    pub timestamp: DateTime<Utc>,
    /// Owning pool.
    pub pool_id: String,
    /// Worker name.
    pub worker_name: String,
    /// `ONLINE` / `OFFLINE`.
    pub status: String,
    /// 10-minute hashrate as displayed.
    pub hashrate_10m: String,
    /// 1-hour hashrate as displayed.
    pub hashrate_1h: String,
    /// 24-hour hashrate as displayed.
    pub hashrate_24h: String,
    /// Last share exchange as displayed.
    pub last_exchange_time: Option<String>,
}

/// A row from `daily_earnings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct EarningRow {
    /// Row id.
    pub id: i64,
    /// Owning pool.
    pub pool_id: String,
    /// Date as displayed.
    pub date: String,
    /// Income as displayed.
    pub total_income: String,
    /// Hashrate as displayed.
    pub hashrate: String,
    /// Time of the last write.
    pub recorded_at: DateTime<Utc>,
}

/// A row from `anomaly_log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct AnomalyRow {
    /// Row id.
    pub id: i64,
    /// Detection time.
    pub timestamp: DateTime<Utc>,
    /// Owning pool.
    pub pool_id: String,
    /// `OFFLINE_WORKERS` / `HASHRATE_DROP`.
    pub anomaly_type: String,
    /// Human-readable description.
    pub description: String,
    /// `MEDIUM` / `HIGH`.
    pub severity: String,
    /// Set only by operators.
    pub resolved: bool,
}

/// What one persisted cycle wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    /// Cycle timestamp shared by every row written.
    pub timestamp: DateTime<Utc>,
    /// Id of the new summary row; `None` when the summary was empty.
    pub snapshot_id: Option<i64>,
    /// Worker rows inserted.
    pub workers_written: usize,
    /// Earnings rows inserted or replaced.
    pub earnings_written: usize,
}

/// Row counts across the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct StoreStats {
    /// Registered pools.
    pub pools: i64,
    /// Active pools.
    pub active_pools: i64,
    /// Summary rows.
    pub snapshots: i64,
    /// Worker rows.
    pub worker_rows: i64,
    /// Earnings rows.
    pub earnings: i64,
    /// Anomaly rows.
    pub anomalies: i64,
    /// Oldest summary row.
    pub first_snapshot_at: Option<DateTime<Utc>>,
    /// Newest summary row.
    pub last_snapshot_at: Option<DateTime<Utc>>,
}
