//! SQLite implementation of the local store.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::Mutex;

use super::models::{
    AnomalyRow, EarningRow, PersistOutcome, PoolMetadataRow, SnapshotRow, StoreStats, WorkerRow,
};
use crate::config::{PoolConfig, PoolsFile, PoolsFileMetadata};
use crate::domain::{
    Anomaly, PoolId, PoolIdentity, PoolRecord, PoolUpdate, ScrapedSnapshot, SummaryField,
    WorkerStatus,
};
use crate::error::MonitorError;
use crate::normalize::{hashrate_to_ths, parse_btc, parse_count};

/// Version written into exported pools files.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Scrape cadence written into exported pool entries.
pub const EXPORT_SCRAPE_INTERVAL_MINUTES: u32 = 10;

const POOL_COLUMNS: &str = "pool_id, pool_name, observer_url, client_name, country, company, \
     location, contact_email, tags, active, created_at, updated_at";

const SNAPSHOT_COLUMNS: &str = "id, timestamp, pool_id, observer_url, current_hashrate, \
     current_hashrate_ths, avg_hashrate_24h, avg_hashrate_24h_ths, online_workers, \
     offline_workers, balance, balance_btc, last_income, last_income_btc";

const WORKER_COLUMNS: &str = "id, timestamp, pool_id, worker_name, status, hashrate_10m, \
     hashrate_1h, hashrate_24h, last_exchange_time";

/// Fixed-width UTC text so that string order matches time order.
pub(crate) fn db_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Dashboard dates are `D/M/YYYY`; month-first is accepted as a fallback.
fn parse_earning_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date, "%m/%d/%Y"))
        .ok()
}

fn count_or_zero(snapshot: &ScrapedSnapshot, field: SummaryField) -> i64 {
    match snapshot.field(field) {
        None => 0,
        Some(text) => parse_count(text).map_or_else(
            || {
                tracing::warn!(field = field.as_str(), value = %text, "unparsable worker count");
                0
            },
            i64::from,
        ),
    }
}

/// SQLite-backed local store.
///
/// Cloning is cheap; clones share the connection pool and the writer lock.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and applies
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] if the URL is invalid, the
    /// database cannot be opened or a migration fails.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, MonitorError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(acquire_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Opens a private in-memory database.
    ///
    /// Uses a single connection that is never recycled, since every
    /// in-memory connection is a separate database.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] if a migration fails.
    pub async fn in_memory() -> Result<Self, MonitorError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, MonitorError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    // -- Pool administration -------------------------------------------

    /// Inserts a pool or refreshes its metadata if it already exists.
    ///
    /// `created_at` is kept on refresh.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn register_pool(&self, identity: &PoolIdentity) -> Result<(), MonitorError> {
        let _guard = self.writer.lock().await;
        let now = db_time(Utc::now());
        sqlx::query(
            "INSERT INTO pool_metadata (pool_id, pool_name, observer_url, client_name, country, \
             company, location, contact_email, tags, active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11) \
             ON CONFLICT(pool_id) DO UPDATE SET \
             pool_name = excluded.pool_name, observer_url = excluded.observer_url, \
             client_name = excluded.client_name, country = excluded.country, \
             company = excluded.company, location = excluded.location, \
             contact_email = excluded.contact_email, tags = excluded.tags, \
             active = excluded.active, updated_at = excluded.updated_at",
        )
        .bind(identity.pool_id.as_str())
        .bind(&identity.pool_name)
        .bind(&identity.observer_url)
        .bind(&identity.client_name)
        .bind(&identity.country)
        .bind(&identity.company)
        .bind(&identity.location)
        .bind(&identity.contact_email)
        .bind(tags_json(&identity.tags)?)
        .bind(identity.active)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Adds a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::PoolAlreadyExists`] if the id is taken, or
    /// [`MonitorError::Persistence`] on database failure.
    pub async fn add_pool(&self, identity: &PoolIdentity) -> Result<PoolRecord, MonitorError> {
        let _guard = self.writer.lock().await;
        if self.fetch_pool(&identity.pool_id).await?.is_some() {
            return Err(MonitorError::PoolAlreadyExists(identity.pool_id.to_string()));
        }
        let now = db_time(Utc::now());
        sqlx::query(
            "INSERT INTO pool_metadata (pool_id, pool_name, observer_url, client_name, country, \
             company, location, contact_email, tags, active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        )
        .bind(identity.pool_id.as_str())
        .bind(&identity.pool_name)
        .bind(&identity.observer_url)
        .bind(&identity.client_name)
        .bind(&identity.country)
        .bind(&identity.company)
        .bind(&identity.location)
        .bind(&identity.contact_email)
        .bind(tags_json(&identity.tags)?)
        .bind(identity.active)
        .bind(now)
        .execute(&self.pool)
        .await?;
        tracing::info!(pool_id = %identity.pool_id, "pool added");
        self.fetch_pool(&identity.pool_id)
            .await?
            .ok_or_else(|| MonitorError::PoolNotFound(identity.pool_id.to_string()))
    }

    /// Applies a partial metadata update.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::PoolNotFound`] if the pool does not exist,
    /// or [`MonitorError::Persistence`] on database failure.
    pub async fn update_pool(
        &self,
        pool_id: &PoolId,
        update: PoolUpdate,
    ) -> Result<PoolRecord, MonitorError> {
        let _guard = self.writer.lock().await;
        let Some(mut record) = self.fetch_pool(pool_id).await? else {
            return Err(MonitorError::PoolNotFound(pool_id.to_string()));
        };
        if update.is_empty() {
            return Ok(record);
        }
        update.apply(&mut record.identity);
        let identity = &record.identity;
        sqlx::query(
            "UPDATE pool_metadata SET pool_name = ?2, observer_url = ?3, client_name = ?4, \
             country = ?5, company = ?6, location = ?7, contact_email = ?8, tags = ?9, \
             active = ?10, updated_at = ?11 WHERE pool_id = ?1",
        )
        .bind(pool_id.as_str())
        .bind(&identity.pool_name)
        .bind(&identity.observer_url)
        .bind(&identity.client_name)
        .bind(&identity.country)
        .bind(&identity.company)
        .bind(&identity.location)
        .bind(&identity.contact_email)
        .bind(tags_json(&identity.tags)?)
        .bind(identity.active)
        .bind(db_time(Utc::now()))
        .execute(&self.pool)
        .await?;
        tracing::info!(%pool_id, "pool updated");
        self.fetch_pool(pool_id)
            .await?
            .ok_or_else(|| MonitorError::PoolNotFound(pool_id.to_string()))
    }

    /// Activates or deactivates a pool.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::PoolNotFound`] if the pool does not exist,
    /// or [`MonitorError::Persistence`] on database failure.
    pub async fn set_active(&self, pool_id: &PoolId, active: bool) -> Result<(), MonitorError> {
        let _guard = self.writer.lock().await;
        let result =
            sqlx::query("UPDATE pool_metadata SET active = ?2, updated_at = ?3 WHERE pool_id = ?1")
                .bind(pool_id.as_str())
                .bind(active)
                .bind(db_time(Utc::now()))
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(MonitorError::PoolNotFound(pool_id.to_string()));
        }
        tracing::info!(%pool_id, active, "pool activation changed");
        Ok(())
    }

    /// Lists pools ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure or
    /// malformed stored tags.
    pub async fn list_pools(&self, active_only: bool) -> Result<Vec<PoolRecord>, MonitorError> {
        let sql = if active_only {
            format!("SELECT {POOL_COLUMNS} FROM pool_metadata WHERE active = 1 ORDER BY pool_id")
        } else {
            format!("SELECT {POOL_COLUMNS} FROM pool_metadata ORDER BY pool_id")
        };
        sqlx::query_as::<_, PoolMetadataRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PoolRecord::try_from)
            .collect()
    }

    /// Returns one pool.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::PoolNotFound`] if the pool does not exist,
    /// or [`MonitorError::Persistence`] on database failure.
    pub async fn get_pool(&self, pool_id: &PoolId) -> Result<PoolRecord, MonitorError> {
        self.fetch_pool(pool_id)
            .await?
            .ok_or_else(|| MonitorError::PoolNotFound(pool_id.to_string()))
    }

    async fn fetch_pool(&self, pool_id: &PoolId) -> Result<Option<PoolRecord>, MonitorError> {
        let sql = format!("SELECT {POOL_COLUMNS} FROM pool_metadata WHERE pool_id = ?1");
        sqlx::query_as::<_, PoolMetadataRow>(&sql)
            .bind(pool_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(PoolRecord::try_from)
            .transpose()
    }

    /// Removes a pool and every row referencing it, in one transaction.
    ///
    /// Returns the number of rows deleted across all tables.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::PoolNotFound`] if the pool does not exist,
    /// or [`MonitorError::Persistence`] on database failure (nothing is
    /// deleted in that case).
    pub async fn delete_pool(&self, pool_id: &PoolId) -> Result<u64, MonitorError> {
        let _guard = self.writer.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;
        for table in ["anomaly_log", "daily_earnings", "worker_status", "pool_summary"] {
            deleted += sqlx::query(&format!("DELETE FROM {table} WHERE pool_id = ?1"))
                .bind(pool_id.as_str())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        let pools = sqlx::query("DELETE FROM pool_metadata WHERE pool_id = ?1")
            .bind(pool_id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if pools == 0 {
            tx.rollback().await?;
            return Err(MonitorError::PoolNotFound(pool_id.to_string()));
        }
        tx.commit().await?;
        deleted += pools;
        tracing::info!(%pool_id, rows = deleted, "pool deleted");
        Ok(deleted)
    }

    /// Writes every registered pool to a pools file at `path`.
    ///
    /// Returns the number of pools written.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] if the pools cannot be read,
    /// or [`MonitorError::Internal`] if the file cannot be written.
    pub async fn export_config(&self, path: &Path) -> Result<usize, MonitorError> {
        let records = self.list_pools(false).await?;
        let pools: Vec<PoolConfig> = records
            .into_iter()
            .map(|record| PoolConfig {
                scrape_interval_minutes: Some(EXPORT_SCRAPE_INTERVAL_MINUTES),
                ..PoolConfig::from(record)
            })
            .collect();
        let file = PoolsFile {
            metadata: Some(PoolsFileMetadata {
                version: EXPORT_FORMAT_VERSION.to_string(),
                last_updated: Utc::now(),
                total_pools: pools.len(),
            }),
            pools,
        };
        file.write(path).await?;
        tracing::info!(path = %path.display(), pools = file.pools.len(), "pools config exported");
        Ok(file.pools.len())
    }

    // -- Scrape cycle writes -------------------------------------------

    /// Persists one scrape atomically.
    ///
    /// The summary becomes one `pool_summary` row unless it is empty; every
    /// worker becomes a `worker_status` row stamped with `timestamp`; every
    /// earning replaces the stored row for its date. Either everything is
    /// written or nothing is.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::PoolNotFound`] if the pool is not registered,
    /// or [`MonitorError::Persistence`] if any write fails.
    pub async fn persist_snapshot(
        &self,
        pool: &PoolIdentity,
        snapshot: &ScrapedSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Result<PersistOutcome, MonitorError> {
        let _guard = self.writer.lock().await;
        let ts = db_time(timestamp);
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM pool_metadata WHERE pool_id = ?1")
                .bind(pool.pool_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(MonitorError::PoolNotFound(pool.pool_id.to_string()));
        }

        let snapshot_id = if snapshot.summary.is_empty() {
            None
        } else {
            let text = |field| snapshot.field(field).unwrap_or_default();
            let current = text(SummaryField::CurrentHashrate);
            let average = text(SummaryField::AvgHashrate24h);
            let balance = text(SummaryField::Balance);
            let last_income = text(SummaryField::LastIncome);
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO pool_summary (timestamp, pool_id, observer_url, current_hashrate, \
                 current_hashrate_ths, avg_hashrate_24h, avg_hashrate_24h_ths, online_workers, \
                 offline_workers, balance, balance_btc, last_income, last_income_btc) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) RETURNING id",
            )
            .bind(&ts)
            .bind(pool.pool_id.as_str())
            .bind(&pool.observer_url)
            .bind(current)
            .bind(hashrate_to_ths(current))
            .bind(average)
            .bind(hashrate_to_ths(average))
            .bind(count_or_zero(snapshot, SummaryField::OnlineWorkers))
            .bind(count_or_zero(snapshot, SummaryField::OfflineWorkers))
            .bind(balance)
            .bind(parse_btc(balance))
            .bind(last_income)
            .bind(parse_btc(last_income))
            .fetch_one(&mut *tx)
            .await?;
            Some(id)
        };

        for worker in &snapshot.workers {
            sqlx::query(
                "INSERT INTO worker_status (timestamp, pool_id, worker_name, status, \
                 hashrate_10m, hashrate_1h, hashrate_24h, last_exchange_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&ts)
            .bind(pool.pool_id.as_str())
            .bind(&worker.name)
            .bind(worker.status.as_str())
            .bind(&worker.hashrate_10m)
            .bind(&worker.hashrate_1h)
            .bind(&worker.hashrate_24h)
            .bind(worker.last_exchange_time.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        for earning in &snapshot.earnings {
            sqlx::query(
                "INSERT INTO daily_earnings (pool_id, date, total_income, hashrate, recorded_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(pool_id, date) DO UPDATE SET \
                 total_income = excluded.total_income, hashrate = excluded.hashrate, \
                 recorded_at = excluded.recorded_at",
            )
            .bind(pool.pool_id.as_str())
            .bind(&earning.date)
            .bind(&earning.total_income)
            .bind(&earning.hashrate)
            .bind(&ts)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        let outcome = PersistOutcome {
            timestamp,
            snapshot_id,
            workers_written: snapshot.workers.len(),
            earnings_written: snapshot.earnings.len(),
        };
        tracing::debug!(
            pool_id = %pool.pool_id,
            snapshot_id,
            workers = outcome.workers_written,
            earnings = outcome.earnings_written,
            "snapshot persisted"
        );
        Ok(outcome)
    }

    /// Appends anomaly records. Returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure; no record
    /// is written in that case.
    pub async fn insert_anomalies(
        &self,
        pool_id: &PoolId,
        anomalies: &[Anomaly],
        timestamp: DateTime<Utc>,
    ) -> Result<usize, MonitorError> {
        if anomalies.is_empty() {
            return Ok(0);
        }
        let _guard = self.writer.lock().await;
        let ts = db_time(timestamp);
        let mut tx = self.pool.begin().await?;
        for anomaly in anomalies {
            sqlx::query(
                "INSERT INTO anomaly_log (timestamp, pool_id, anomaly_type, description, severity) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&ts)
            .bind(pool_id.as_str())
            .bind(anomaly.kind.as_str())
            .bind(&anomaly.description)
            .bind(anomaly.severity.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(anomalies.len())
    }

    // -- Reads ---------------------------------------------------------

    /// Normalized current hashrates of the newest `limit` summary rows,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn recent_current_hashrates(
        &self,
        pool_id: &PoolId,
        limit: u32,
    ) -> Result<Vec<f64>, MonitorError> {
        let values = sqlx::query_scalar::<_, f64>(
            "SELECT current_hashrate_ths FROM pool_summary WHERE pool_id = ?1 \
             ORDER BY timestamp DESC, id DESC LIMIT ?2",
        )
        .bind(pool_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }

    /// Newest summary row of a pool.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn latest_snapshot(
        &self,
        pool_id: &PoolId,
    ) -> Result<Option<SnapshotRow>, MonitorError> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM pool_summary WHERE pool_id = ?1 \
             ORDER BY timestamp DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, SnapshotRow>(&sql)
            .bind(pool_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// The current worker set: rows sharing the pool's newest worker
    /// timestamp, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn current_workers(
        &self,
        pool_id: &PoolId,
        status: Option<WorkerStatus>,
    ) -> Result<Vec<WorkerRow>, MonitorError> {
        let sql = format!(
            "SELECT {WORKER_COLUMNS} FROM worker_status WHERE pool_id = ?1 \
             AND timestamp = (SELECT MAX(timestamp) FROM worker_status WHERE pool_id = ?1) \
             AND (?2 IS NULL OR status = ?2) ORDER BY id"
        );
        let rows = sqlx::query_as::<_, WorkerRow>(&sql)
            .bind(pool_id.as_str())
            .bind(status.map(WorkerStatus::as_str))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Most recent `limit` earnings by calendar date, newest first.
    ///
    /// Rows whose date cannot be parsed sort last.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn recent_earnings(
        &self,
        pool_id: &PoolId,
        limit: usize,
    ) -> Result<Vec<EarningRow>, MonitorError> {
        let mut rows = sqlx::query_as::<_, EarningRow>(
            "SELECT id, pool_id, date, total_income, hashrate, recorded_at \
             FROM daily_earnings WHERE pool_id = ?1",
        )
        .bind(pool_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.sort_by(|a, b| {
            parse_earning_date(&b.date)
                .cmp(&parse_earning_date(&a.date))
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    /// Anomalies recorded at or after `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn anomalies_since(
        &self,
        pool_id: &PoolId,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnomalyRow>, MonitorError> {
        let rows = sqlx::query_as::<_, AnomalyRow>(
            "SELECT id, timestamp, pool_id, anomaly_type, description, severity, resolved \
             FROM anomaly_log WHERE pool_id = ?1 AND timestamp >= ?2 \
             ORDER BY timestamp DESC, id DESC",
        )
        .bind(pool_id.as_str())
        .bind(db_time(since))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Row counts and the snapshot time range.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn stats(&self) -> Result<StoreStats, MonitorError> {
        let count = |sql: &'static str| sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool);
        let (first, last): (Option<String>, Option<String>) =
            sqlx::query_as("SELECT MIN(timestamp), MAX(timestamp) FROM pool_summary")
                .fetch_one(&self.pool)
                .await?;
        let parse = |ts: Option<String>| {
            ts.and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
                .map(|t| t.with_timezone(&Utc))
        };
        Ok(StoreStats {
            pools: count("SELECT COUNT(*) FROM pool_metadata").await?,
            active_pools: count("SELECT COUNT(*) FROM pool_metadata WHERE active = 1").await?,
            snapshots: count("SELECT COUNT(*) FROM pool_summary").await?,
            worker_rows: count("SELECT COUNT(*) FROM worker_status").await?,
            earnings: count("SELECT COUNT(*) FROM daily_earnings").await?,
            anomalies: count("SELECT COUNT(*) FROM anomaly_log").await?,
            first_snapshot_at: parse(first),
            last_snapshot_at: parse(last),
        })
    }
}

fn tags_json(tags: &[String]) -> Result<String, MonitorError> {
    serde_json::to_string(tags).map_err(|e| MonitorError::Internal(format!("encode tags: {e}")))
}
