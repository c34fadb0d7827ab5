//! Shared application state injected into all Axum handlers.

use crate::persistence::SqliteStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Local store; clones share one connection pool.
    pub store: SqliteStore,
}

impl AppState {
    /// Creates the state around a store.
    #[must_use]
    pub const fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}
