//! Domain layer: pool identity, scraped records, anomaly rules and the
//! remote schema.
//!
//! Nothing in here performs I/O. The extractor produces
//! [`ScrapedSnapshot`]s, the store persists them, the anomaly rules turn
//! them into [`Anomaly`]s and the synchronizer reshapes them into the
//! remote entities.

pub mod anomaly;
pub mod pool;
pub mod pool_id;
pub mod remote;
pub mod snapshot;

pub use anomaly::{Anomaly, AnomalyKind, Severity};
pub use pool::{PoolIdentity, PoolRecord, PoolUpdate};
pub use pool_id::PoolId;
pub use remote::RemoteTable;
pub use snapshot::{
    EarningCandidate, ScrapedSnapshot, SummaryField, SummaryMap, WorkerCandidate, WorkerStatus,
};
