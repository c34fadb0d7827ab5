//! Remote backend access.
//!
//! The synchronizer talks to the remote schema only through the
//! [`RemoteStore`] trait: merge-on-conflict upserts and plain inserts of
//! JSON rows. [`PostgrestClient`] speaks the PostgREST dialect over HTTP;
//! [`MemoryRemoteStore`] keeps rows in memory for replay and tests.

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;

pub use memory::MemoryRemoteStore;
pub use postgrest::PostgrestClient;

use crate::domain::RemoteTable;
use crate::error::MonitorError;

/// Write primitives of the remote store.
///
/// Every call is independent; a failure says nothing about other calls.
#[async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug {
    /// Inserts `rows`, merging into existing rows that share the
    /// `on_conflict` columns.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Remote`] if the call fails.
    async fn upsert(
        &self,
        table: RemoteTable,
        on_conflict: &str,
        rows: Vec<serde_json::Value>,
    ) -> Result<(), MonitorError>;

    /// Appends `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Remote`] if the call fails.
    async fn insert(
        &self,
        table: RemoteTable,
        rows: Vec<serde_json::Value>,
    ) -> Result<(), MonitorError>;
}
