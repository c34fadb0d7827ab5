//! Persistence layer: the local SQLite store.
//!
//! [`SqliteStore`] owns every write to the local tables. Writes from
//! concurrently running pool pipelines are serialized through one writer
//! lock; reads go straight to the connection pool.

pub mod models;
pub mod sqlite;

pub use models::{
    AnomalyRow, EarningRow, PersistOutcome, PoolMetadataRow, SnapshotRow, StoreStats, WorkerRow,
};
pub use sqlite::SqliteStore;
