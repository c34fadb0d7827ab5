//! Anomaly detection over a freshly persisted snapshot.

use chrono::{DateTime, Utc};

use crate::domain::anomaly::{HASHRATE_HISTORY_WINDOW, assess_hashrate_drop, assess_offline_workers};
use crate::domain::{Anomaly, PoolId, ScrapedSnapshot, SummaryField};
use crate::error::MonitorError;
use crate::normalize::parse_count;
use crate::persistence::{PersistOutcome, SqliteStore};

/// Runs both anomaly rules after persistence and appends what fires to the
/// anomaly log.
///
/// Detection never fails the cycle: errors are logged and the rule that
/// hit them contributes nothing.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    store: SqliteStore,
}

impl AnomalyDetector {
    /// Creates a detector reading history from and writing to `store`.
    #[must_use]
    pub const fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Evaluates the rules for one cycle and returns the recorded anomalies.
    pub async fn detect(
        &self,
        pool_id: &PoolId,
        snapshot: &ScrapedSnapshot,
        persisted: &PersistOutcome,
    ) -> Vec<Anomaly> {
        let mut fired = Vec::new();
        fired.extend(offline_rule(snapshot));
        if persisted.snapshot_id.is_some() {
            match self.hashrate_rule(pool_id, snapshot).await {
                Ok(anomaly) => fired.extend(anomaly),
                Err(e) => tracing::error!(error = %e, "hashrate-drop rule failed"),
            }
        }
        if fired.is_empty() {
            return fired;
        }
        for anomaly in &fired {
            tracing::warn!(
                anomaly_type = anomaly.kind.as_str(),
                severity = anomaly.severity.as_str(),
                description = %anomaly.description,
                "anomaly detected"
            );
        }
        match self.record(pool_id, &fired, persisted.timestamp).await {
            Ok(()) => fired,
            Err(e) => {
                tracing::error!(error = %e, count = fired.len(), "failed to record anomalies");
                Vec::new()
            }
        }
    }

    async fn hashrate_rule(
        &self,
        pool_id: &PoolId,
        snapshot: &ScrapedSnapshot,
    ) -> Result<Option<Anomaly>, MonitorError> {
        let recent = self
            .store
            .recent_current_hashrates(pool_id, HASHRATE_HISTORY_WINDOW)
            .await?;
        let current_display = snapshot
            .field(SummaryField::CurrentHashrate)
            .unwrap_or_default();
        Ok(assess_hashrate_drop(&recent).map(|drop| drop.into_anomaly(current_display)))
    }

    async fn record(
        &self,
        pool_id: &PoolId,
        anomalies: &[Anomaly],
        timestamp: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        self.store
            .insert_anomalies(pool_id, anomalies, timestamp)
            .await
            .map(|_| ())
    }
}

fn offline_rule(snapshot: &ScrapedSnapshot) -> Option<Anomaly> {
    let text = snapshot.field(SummaryField::OfflineWorkers)?;
    let Some(offline_count) = parse_count(text) else {
        tracing::warn!(value = %text, "offline worker count not numeric, rule skipped");
        return None;
    };
    assess_offline_workers(offline_count, snapshot.offline_worker_names())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AnomalyKind, PoolIdentity, Severity, WorkerCandidate, WorkerStatus};

    async fn setup() -> (SqliteStore, PoolIdentity) {
        let Ok(store) = SqliteStore::in_memory().await else {
            panic!("store should open");
        };
        let pool = PoolIdentity {
            pool_id: PoolId::new("kz-01"),
            pool_name: "KZ 01".to_string(),
            observer_url: "https://observer.test/kz-01".to_string(),
            client_name: String::new(),
            country: String::new(),
            company: String::new(),
            location: String::new(),
            contact_email: String::new(),
            tags: Vec::new(),
            active: true,
        };
        let Ok(()) = store.register_pool(&pool).await else {
            panic!("register failed");
        };
        (store, pool)
    }

    fn snapshot(current: &str, offline: &str) -> ScrapedSnapshot {
        let mut s = ScrapedSnapshot::default();
        s.summary.insert(SummaryField::CurrentHashrate, current.to_string());
        s.summary.insert(SummaryField::OnlineWorkers, "10".to_string());
        s.summary.insert(SummaryField::OfflineWorkers, offline.to_string());
        s
    }

    async fn cycle(
        store: &SqliteStore,
        pool: &PoolIdentity,
        snapshot: &ScrapedSnapshot,
    ) -> Vec<Anomaly> {
        let Ok(persisted) = store.persist_snapshot(pool, snapshot, Utc::now()).await else {
            panic!("persist failed");
        };
        AnomalyDetector::new(store.clone())
            .detect(&pool.pool_id, snapshot, &persisted)
            .await
    }

    #[tokio::test]
    async fn first_cycle_never_reports_a_drop() {
        let (store, pool) = setup().await;
        let fired = cycle(&store, &pool, &snapshot("0 TH/s", "0")).await;
        assert!(fired.is_empty());
    }

    #[tokio::test]
    async fn drop_to_seventy_percent_is_medium() {
        let (store, pool) = setup().await;
        assert!(cycle(&store, &pool, &snapshot("100 TH/s", "0")).await.is_empty());
        let fired = cycle(&store, &pool, &snapshot("70 TH/s", "0")).await;
        let Some(anomaly) = fired.first() else {
            panic!("drop should fire");
        };
        assert_eq!(fired.len(), 1);
        assert_eq!(anomaly.kind, AnomalyKind::HashrateDrop);
        assert_eq!(anomaly.severity, Severity::Medium);
        assert!(anomaly.description.starts_with("Hashrate dropped 30.0%"));
    }

    #[tokio::test]
    async fn offline_workers_are_logged_with_names() {
        let (store, pool) = setup().await;
        let mut s = snapshot("100 TH/s", "6");
        for i in 0..6 {
            s.workers.push(WorkerCandidate {
                name: format!("rig-{i}"),
                status: WorkerStatus::Offline,
                hashrate_10m: "0 H/s".to_string(),
                hashrate_1h: "0 H/s".to_string(),
                hashrate_24h: "0 H/s".to_string(),
                last_exchange_time: None,
            });
        }
        let fired = cycle(&store, &pool, &s).await;
        let Some(anomaly) = fired.first() else {
            panic!("offline rule should fire");
        };
        assert_eq!(anomaly.severity, Severity::High);
        assert!(anomaly.description.contains("rig-4"));
        assert!(!anomaly.description.contains("rig-5"));

        let Ok(logged) = store
            .anomalies_since(&pool.pool_id, Utc::now() - chrono::Duration::hours(1))
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(logged.len(), 1);
    }

    #[tokio::test]
    async fn non_numeric_offline_count_skips_the_rule() {
        let (store, pool) = setup().await;
        let fired = cycle(&store, &pool, &snapshot("100 TH/s", "many")).await;
        assert!(fired.is_empty());
    }
}
