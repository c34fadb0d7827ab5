//! Per-pool scrape cycle: retrieve, extract, persist, detect, synchronize.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::anomaly_detector::AnomalyDetector;
use super::synchronizer::{AccountProfile, SyncReport, Synchronizer};
use crate::config::PoolConfig;
use crate::domain::{Anomaly, PoolId, PoolIdentity, PoolRecord};
use crate::error::MonitorError;
use crate::extract::{ExtractionCoverage, Extractor, PageSource, Vocabulary};
use crate::persistence::{PersistOutcome, SqliteStore};

/// A pool to run a cycle for.
#[derive(Debug, Clone)]
pub struct PoolTarget {
    /// Stored identity.
    pub identity: PoolIdentity,
    /// Remote presentation.
    pub profile: AccountProfile,
}

impl PoolTarget {
    /// Target for a stored pool, taking remote overrides from its pools
    /// file entry when there is one.
    #[must_use]
    pub fn new(record: PoolRecord, config: Option<&PoolConfig>) -> Self {
        let profile = config.map_or_else(
            || AccountProfile::from_identity(&record.identity),
            |c| AccountProfile::from_config(&record.identity, c),
        );
        Self {
            identity: record.identity,
            profile,
        }
    }
}

/// What one successful cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Pool the cycle ran for.
    pub pool_id: PoolId,
    /// Unique id of this cycle, also attached to its log span.
    pub run_id: Uuid,
    /// Cycle start.
    pub started_at: DateTime<Utc>,
    /// How much of the page was recognized.
    pub coverage: ExtractionCoverage,
    /// What was written locally.
    pub persisted: PersistOutcome,
    /// Anomalies recorded.
    pub anomalies: Vec<Anomaly>,
    /// Remote synchronization, when enabled.
    pub sync: Option<SyncReport>,
}

/// Runs scrape cycles.
///
/// A cycle is sequential. Retrieval and persistence failures abort it;
/// detection and synchronization failures only degrade it.
#[derive(Debug, Clone)]
pub struct PoolPipeline {
    source: Arc<dyn PageSource>,
    extractor: Extractor<Vocabulary>,
    store: SqliteStore,
    detector: AnomalyDetector,
    synchronizer: Option<Synchronizer>,
}

impl PoolPipeline {
    /// Creates a pipeline. Without a synchronizer cycles stop after
    /// detection.
    #[must_use]
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: Extractor<Vocabulary>,
        store: SqliteStore,
        synchronizer: Option<Synchronizer>,
    ) -> Self {
        let detector = AnomalyDetector::new(store.clone());
        Self {
            source,
            extractor,
            store,
            detector,
            synchronizer,
        }
    }

    /// Runs one cycle for one pool.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Retrieval`] if the page cannot be loaded,
    /// [`MonitorError::PoolNotFound`] if the pool is not registered, or
    /// [`MonitorError::Persistence`] if the snapshot cannot be written.
    /// Every error names the pool.
    pub async fn run_cycle(&self, target: &PoolTarget) -> Result<CycleReport, MonitorError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "pool_cycle",
            pool_id = %target.identity.pool_id,
            run_id = %run_id,
        );
        let result = self.cycle(target, run_id).instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| tracing::error!(error = %e, "cycle failed"));
        }
        result
    }

    async fn cycle(&self, target: &PoolTarget, run_id: Uuid) -> Result<CycleReport, MonitorError> {
        let pool = &target.identity;
        let started_at = Utc::now();

        let page = self
            .source
            .fetch(&pool.observer_url)
            .await
            .map_err(|e| MonitorError::Retrieval {
                pool_id: pool.pool_id.to_string(),
                message: e.to_string(),
            })?;

        let extraction = self.extractor.extract(&page);
        let coverage = extraction.coverage;
        if coverage.matched_nothing() {
            tracing::warn!(
                lines = coverage.lines_scanned,
                tables = coverage.tables_seen,
                "no label or table recognized; page wording may have changed"
            );
        } else {
            tracing::info!(
                summary_fields = coverage.summary_fields,
                workers = extraction.snapshot.workers.len(),
                earnings = extraction.snapshot.earnings.len(),
                "page extracted"
            );
        }

        let persisted = self
            .store
            .persist_snapshot(pool, &extraction.snapshot, started_at)
            .await
            .map_err(|e| e.for_pool(pool.pool_id.as_str()))?;

        let anomalies = self
            .detector
            .detect(&pool.pool_id, &extraction.snapshot, &persisted)
            .await;

        let sync = match &self.synchronizer {
            Some(synchronizer) => Some(
                synchronizer
                    .sync_pool(&pool.pool_id, &target.profile)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::error!(error = %e, "remote sync could not read local data");
                        SyncReport {
                            account_name: target.profile.account_name.clone(),
                            skipped: Some(e.to_string()),
                            ..SyncReport::default()
                        }
                    }),
            ),
            None => None,
        };

        tracing::info!(anomalies = anomalies.len(), "cycle complete");
        Ok(CycleReport {
            pool_id: pool.pool_id.clone(),
            run_id,
            started_at,
            coverage,
            persisted,
            anomalies,
            sync,
        })
    }

    /// Runs one cycle per target, at most `max_concurrent` at a time.
    ///
    /// Results are returned in target order; one pool failing does not
    /// affect the others.
    pub async fn run_all(
        &self,
        targets: &[PoolTarget],
        max_concurrent: usize,
    ) -> Vec<(PoolId, Result<CycleReport, MonitorError>)> {
        let mut results: Vec<(usize, PoolId, Result<CycleReport, MonitorError>)> =
            stream::iter(targets.iter().enumerate().map(|(index, target)| async move {
                (index, target.identity.pool_id.clone(), self.run_cycle(target).await)
            }))
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await;
        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, pool_id, result)| (pool_id, result))
            .collect()
    }
}
