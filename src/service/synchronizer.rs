//! Mirrors local telemetry into the remote schema.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::config::{DEFAULT_COMPANY, DEFAULT_SITE, PoolConfig};
use crate::domain::anomaly::offline_workers_severity;
use crate::domain::remote::{
    RemoteAccount, RemoteAlert, RemoteDevice, RemoteHashrateSample, RemoteIncomeRecord, device_id,
};
use crate::domain::{PoolId, PoolIdentity, RemoteTable};
use crate::error::MonitorError;
use crate::normalize::parse_btc;
use crate::persistence::{EarningRow, SnapshotRow, SqliteStore, WorkerRow};
use crate::remote::RemoteStore;

/// At most this many workers are mirrored as devices.
pub const MAX_DEVICES: usize = 200;

/// Devices sent per remote call.
pub const DEVICE_BATCH_SIZE: usize = 50;

/// Earnings rows mirrored as income records.
pub const INCOME_RECORDS: usize = 30;

/// How a pool is presented in the remote schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    /// Remote account key.
    pub account_name: String,
    /// Owning company.
    pub company: String,
    /// Site label.
    pub site: String,
    /// Client grouping.
    pub group_name: String,
    /// Device location.
    pub country: String,
}

impl AccountProfile {
    /// Profile derived from the pool identity alone.
    #[must_use]
    pub fn from_identity(identity: &PoolIdentity) -> Self {
        Self::build(identity, identity.pool_id.as_str(), DEFAULT_SITE)
    }

    /// Profile honoring the account name and site overrides of a pools
    /// file entry.
    #[must_use]
    pub fn from_config(identity: &PoolIdentity, config: &PoolConfig) -> Self {
        Self::build(identity, config.account_name(), config.site())
    }

    fn build(identity: &PoolIdentity, account_name: &str, site: &str) -> Self {
        let or_default = |value: &str, default: &str| {
            if value.is_empty() { default.to_string() } else { value.to_string() }
        };
        Self {
            company: or_default(&identity.company, DEFAULT_COMPANY),
            site: site.to_string(),
            group_name: or_default(&identity.client_name, account_name),
            country: identity.country.clone(),
            account_name: account_name.to_string(),
        }
    }
}

/// Result of one remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallOutcome {
    /// Target table.
    pub table: &'static str,
    /// Rows sent.
    pub rows: usize,
    /// Failure message; `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallOutcome {
    /// Whether the call succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Rows the remote store accepted, per entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    /// Account upserts.
    pub accounts: usize,
    /// Hashrate samples.
    pub hashrates: usize,
    /// Device upserts.
    pub devices: usize,
    /// Income records.
    pub income_records: usize,
    /// Alert upserts.
    pub alerts: usize,
    /// Earnings rows left out because their income did not parse.
    pub income_skipped: usize,
}

/// Outcome of synchronizing one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Remote account the pool was mirrored under.
    pub account_name: String,
    /// One entry per remote call, in call order.
    pub calls: Vec<CallOutcome>,
    /// Accepted rows per entity.
    pub counts: SyncCounts,
    /// Why nothing was sent, when nothing was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl SyncReport {
    /// `true` when every attempted call succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.calls.iter().all(CallOutcome::succeeded)
    }

    /// Number of failed calls.
    #[must_use]
    pub fn failed_calls(&self) -> usize {
        self.calls.iter().filter(|c| !c.succeeded()).count()
    }
}

/// Reflects the local store into the remote one.
///
/// Every remote call is attempted once and independently of the others;
/// a failed call is recorded in the [`SyncReport`] and the rest still run.
/// Local tables are only read.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    store: SqliteStore,
    remote: Arc<dyn RemoteStore>,
}

impl Synchronizer {
    /// Creates a synchronizer.
    #[must_use]
    pub fn new(store: SqliteStore, remote: Arc<dyn RemoteStore>) -> Self {
        Self { store, remote }
    }

    /// Synchronizes one pool.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] only if the local reads fail;
    /// remote failures are reported inside the [`SyncReport`].
    pub async fn sync_pool(
        &self,
        pool_id: &PoolId,
        profile: &AccountProfile,
    ) -> Result<SyncReport, MonitorError> {
        let mut report = SyncReport {
            account_name: profile.account_name.clone(),
            ..SyncReport::default()
        };
        let Some(snapshot) = self.store.latest_snapshot(pool_id).await? else {
            tracing::warn!("no summary snapshot to synchronize");
            report.skipped = Some("no summary snapshot".to_string());
            return Ok(report);
        };
        let workers = self.store.current_workers(pool_id, None).await?;
        let earnings = self.store.recent_earnings(pool_id, INCOME_RECORDS).await?;

        report.counts.accounts = self.push_account(profile, &snapshot, &mut report.calls).await;
        report.counts.hashrates = self.push_hashrate(profile, &snapshot, &mut report.calls).await;
        report.counts.devices = self.push_devices(profile, &workers, &mut report.calls).await;
        let (income, skipped) = self.push_income(profile, &earnings, &mut report.calls).await;
        report.counts.income_records = income;
        report.counts.income_skipped = skipped;
        report.counts.alerts = self.push_alert(profile, &snapshot, &mut report.calls).await;

        if report.is_complete() {
            tracing::info!(counts = ?report.counts, "remote sync complete");
        } else {
            tracing::warn!(
                failed_calls = report.failed_calls(),
                counts = ?report.counts,
                "remote sync partially failed"
            );
        }
        Ok(report)
    }

    /// Sends one call and records it. Returns the rows accepted.
    async fn call(
        &self,
        table: RemoteTable,
        rows: Vec<serde_json::Value>,
        calls: &mut Vec<CallOutcome>,
    ) -> usize {
        let sent = rows.len();
        let result = match table.conflict_key() {
            Some(key) => self.remote.upsert(table, key, rows).await,
            None => self.remote.insert(table, rows).await,
        };
        let error = result.err().map(|e| {
            tracing::error!(table = table.name(), error = %e, "remote call failed");
            e.to_string()
        });
        let accepted = if error.is_none() { sent } else { 0 };
        calls.push(CallOutcome {
            table: table.name(),
            rows: sent,
            error,
        });
        accepted
    }

    async fn push_account(
        &self,
        profile: &AccountProfile,
        snapshot: &SnapshotRow,
        calls: &mut Vec<CallOutcome>,
    ) -> usize {
        let account = RemoteAccount {
            account_name: profile.account_name.clone(),
            coin_type: "BTC".to_string(),
            is_active: true,
            company: profile.company.clone(),
            site: profile.site.clone(),
            account_type: "kzpool".to_string(),
            group_name: profile.group_name.clone(),
            balance: snapshot.balance_btc,
            earn_24_hours: snapshot.last_income_btc,
            updated_at: Utc::now(),
        };
        self.send(RemoteTable::Accounts, [account], calls).await
    }

    async fn push_hashrate(
        &self,
        profile: &AccountProfile,
        snapshot: &SnapshotRow,
        calls: &mut Vec<CallOutcome>,
    ) -> usize {
        let online = u32::try_from(snapshot.online_workers).unwrap_or_default();
        let offline = u32::try_from(snapshot.offline_workers).unwrap_or_default();
        let now = Utc::now();
        let sample = RemoteHashrateSample {
            account_name: profile.account_name.clone(),
            hashrate_10m: snapshot.current_hashrate_ths,
            hashrate_1h: snapshot.current_hashrate_ths,
            hashrate_1d: snapshot.avg_hashrate_24h_ths,
            worker_count: online.saturating_add(offline),
            active_workers: online,
            reject_rate: 0.0,
            timestamp: now,
            created_at: now,
        };
        self.send(RemoteTable::Hashrates, [sample], calls).await
    }

    async fn push_devices(
        &self,
        profile: &AccountProfile,
        workers: &[WorkerRow],
        calls: &mut Vec<CallOutcome>,
    ) -> usize {
        let now = Utc::now();
        let devices: Vec<RemoteDevice> = workers
            .iter()
            .take(MAX_DEVICES)
            .map(|w| RemoteDevice {
                device_id: device_id(&profile.account_name, &w.worker_name),
                serial_number: w.worker_name.clone(),
                account_name: profile.account_name.clone(),
                worker_name: w.worker_name.clone(),
                device_type: "ASIC".to_string(),
                status: w.status.to_lowercase(),
                manufacturer: "Unknown".to_string(),
                model: "Unknown".to_string(),
                site: profile.site.clone(),
                location: profile.country.clone(),
                created_at: now,
                updated_at: now,
            })
            .collect();
        let mut accepted = 0;
        for batch in devices.chunks(DEVICE_BATCH_SIZE) {
            accepted += self.send(RemoteTable::Devices, batch.iter(), calls).await;
        }
        accepted
    }

    async fn push_income(
        &self,
        profile: &AccountProfile,
        earnings: &[EarningRow],
        calls: &mut Vec<CallOutcome>,
    ) -> (usize, usize) {
        let now = Utc::now();
        let records: Vec<RemoteIncomeRecord> = earnings
            .iter()
            .filter_map(|e| {
                let btc_amount = parse_btc(&e.total_income)?;
                Some(RemoteIncomeRecord {
                    account_name: profile.account_name.clone(),
                    date: e.date.clone(),
                    btc_amount,
                    usd_value: 0.0,
                    source: profile.site.clone(),
                    transaction_type: "mining_reward".to_string(),
                    created_at: now,
                })
            })
            .collect();
        let skipped = earnings.len() - records.len();
        if skipped > 0 {
            tracing::debug!(skipped, "earnings with unparsable income left out");
        }
        if records.is_empty() {
            return (0, skipped);
        }
        let accepted = self.send(RemoteTable::IncomeTracking, records, calls).await;
        (accepted, skipped)
    }

    async fn push_alert(
        &self,
        profile: &AccountProfile,
        snapshot: &SnapshotRow,
        calls: &mut Vec<CallOutcome>,
    ) -> usize {
        let offline = u32::try_from(snapshot.offline_workers).unwrap_or_default();
        let Some(severity) = offline_workers_severity(offline) else {
            return 0;
        };
        let alert = RemoteAlert {
            account_name: profile.account_name.clone(),
            alert_type: "offline_workers".to_string(),
            severity: severity.as_remote_str().to_string(),
            message: format!("{offline} workers offline"),
            resolved: false,
            created_at: Utc::now(),
        };
        self.send(RemoteTable::Alerts, [alert], calls).await
    }

    /// Serializes rows and sends them as one call.
    async fn send<T: Serialize>(
        &self,
        table: RemoteTable,
        rows: impl IntoIterator<Item = T>,
        calls: &mut Vec<CallOutcome>,
    ) -> usize {
        let encoded: Result<Vec<serde_json::Value>, _> =
            rows.into_iter().map(serde_json::to_value).collect();
        match encoded {
            Ok(values) => self.call(table, values, calls).await,
            Err(e) => {
                tracing::error!(table = table.name(), error = %e, "remote payload encoding failed");
                calls.push(CallOutcome {
                    table: table.name(),
                    rows: 0,
                    error: Some(format!("encode: {e}")),
                });
                0
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::{
        EarningCandidate, ScrapedSnapshot, SummaryField, WorkerCandidate, WorkerStatus,
    };
    use crate::remote::MemoryRemoteStore;

    fn identity() -> PoolIdentity {
        PoolIdentity {
            pool_id: PoolId::new("kz-01"),
            pool_name: "KZ 01".to_string(),
            observer_url: String::new(),
            client_name: String::new(),
            country: "Kazakhstan".to_string(),
            company: String::new(),
            location: String::new(),
            contact_email: String::new(),
            tags: Vec::new(),
            active: true,
        }
    }

    #[test]
    fn profile_defaults() {
        let profile = AccountProfile::from_identity(&identity());
        assert_eq!(profile.account_name, "kz-01");
        assert_eq!(profile.company, DEFAULT_COMPANY);
        assert_eq!(profile.site, DEFAULT_SITE);
        assert_eq!(profile.group_name, "kz-01");
    }

    #[test]
    fn profile_honors_file_overrides() {
        let json = r#"{"pool_id":"kz-01","account_name":"acct-a","site":"Ekibastuz"}"#;
        let Ok(config) = serde_json::from_str::<PoolConfig>(json) else {
            panic!("parse failed");
        };
        let mut id = identity();
        id.client_name = "Client A".to_string();
        let profile = AccountProfile::from_config(&id, &config);
        assert_eq!(profile.account_name, "acct-a");
        assert_eq!(profile.site, "Ekibastuz");
        assert_eq!(profile.group_name, "Client A");
    }

    #[test]
    fn blank_overrides_use_defaults() {
        let json = r#"{"pool_id":"kz-01","account_name":"","site":""}"#;
        let Ok(config) = serde_json::from_str::<PoolConfig>(json) else {
            panic!("parse failed");
        };
        let profile = AccountProfile::from_config(&identity(), &config);
        assert_eq!(profile, AccountProfile::from_identity(&identity()));
    }

    #[test]
    fn report_is_partial_when_any_call_failed() {
        let mut report = SyncReport::default();
        assert!(report.is_complete());
        report.calls.push(CallOutcome {
            table: "accounts",
            rows: 1,
            error: None,
        });
        report.calls.push(CallOutcome {
            table: "devices",
            rows: 50,
            error: Some("HTTP 503".to_string()),
        });
        assert!(!report.is_complete());
        assert_eq!(report.failed_calls(), 1);
    }

    fn large_snapshot() -> ScrapedSnapshot {
        let mut snapshot = ScrapedSnapshot::default();
        snapshot.summary.insert(SummaryField::CurrentHashrate, "26 PH/s".to_string());
        snapshot.summary.insert(SummaryField::OnlineWorkers, "260".to_string());
        snapshot.summary.insert(SummaryField::OfflineWorkers, "0".to_string());
        snapshot.workers = (0..260)
            .map(|i| WorkerCandidate {
                name: format!("rig {i}"),
                status: WorkerStatus::Online,
                hashrate_10m: "100 TH/s".to_string(),
                hashrate_1h: "100 TH/s".to_string(),
                hashrate_24h: "100 TH/s".to_string(),
                last_exchange_time: None,
            })
            .collect();
        // 1/3 through 7/4: 38 days. Three unparsable amounts fall inside
        // the newest 30 days, one (2/3) falls outside.
        let dates = (1..=31).map(|d| (d, 3)).chain((1..=7).map(|d| (d, 4)));
        snapshot.earnings = dates
            .map(|(day, month)| {
                let unparsable = matches!((day, month), (7, 4) | (20, 3) | (15, 3) | (2, 3));
                EarningCandidate {
                    date: format!("{day}/{month}/2025"),
                    total_income: if unparsable {
                        "n/a".to_string()
                    } else {
                        format!("0.00{day:02} BTC")
                    },
                    hashrate: "26 PH/s".to_string(),
                }
            })
            .collect();
        snapshot
    }

    #[tokio::test]
    async fn sync_caps_devices_and_income() {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("in-memory store failed");
        };
        let pool = identity();
        if let Err(e) = store.register_pool(&pool).await {
            panic!("register failed: {e}");
        }
        let at = Utc
            .with_ymd_and_hms(2025, 4, 8, 9, 0, 0)
            .single()
            .unwrap_or_default();
        if let Err(e) = store.persist_snapshot(&pool, &large_snapshot(), at).await {
            panic!("persist failed: {e}");
        }

        let remote = Arc::new(MemoryRemoteStore::new());
        let synchronizer =
            Synchronizer::new(store, Arc::clone(&remote) as Arc<dyn RemoteStore>);
        let profile = AccountProfile::from_identity(&pool);
        let Ok(report) = synchronizer.sync_pool(&pool.pool_id, &profile).await else {
            panic!("sync failed");
        };

        assert!(report.is_complete());
        assert_eq!(report.counts.devices, MAX_DEVICES);
        assert_eq!(report.counts.income_records, 27);
        assert_eq!(report.counts.income_skipped, 3);
        assert_eq!(report.counts.alerts, 0);

        assert_eq!(remote.call_count(RemoteTable::Devices).await, 4);
        assert_eq!(remote.call_count(RemoteTable::IncomeTracking).await, 1);
        assert_eq!(remote.call_count(RemoteTable::Alerts).await, 0);

        let devices = remote.rows(RemoteTable::Devices).await;
        assert_eq!(devices.len(), MAX_DEVICES);
        assert_eq!(devices[0]["device_id"], "KZ_kz-01_rig_0");
        assert_eq!(devices[0]["worker_name"], "rig 0");
        assert!(devices.iter().all(|d| d["worker_name"] != "rig 200"));

        let income = remote.rows(RemoteTable::IncomeTracking).await;
        assert_eq!(income.len(), 27);
        assert_eq!(income[0]["date"], "6/4/2025");
        assert!(income.iter().all(|r| r["date"] != "8/3/2025"));
        assert!(income.iter().any(|r| r["date"] == "9/3/2025"));
    }
}
