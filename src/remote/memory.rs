//! In-memory remote store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::RemoteStore;
use crate::domain::RemoteTable;
use crate::error::MonitorError;

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<RemoteTable, Vec<Value>>,
    calls: Vec<RemoteTable>,
    failing: HashSet<RemoteTable>,
}

/// Remote store that keeps rows in memory.
///
/// Upserts merge object fields into the existing row whose conflict
/// columns match, so repeated upserts of one key never duplicate it.
/// Tables can be made to fail to exercise partial synchronization.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    inner: RwLock<Tables>,
}

impl MemoryRemoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call against `table` fail.
    pub async fn fail_table(&self, table: RemoteTable) {
        self.inner.write().await.failing.insert(table);
    }

    /// Rows currently held for `table`.
    pub async fn rows(&self, table: RemoteTable) -> Vec<Value> {
        self.inner
            .read()
            .await
            .rows
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of calls made against `table`, failed ones included.
    pub async fn call_count(&self, table: RemoteTable) -> usize {
        self.inner
            .read()
            .await
            .calls
            .iter()
            .filter(|t| **t == table)
            .count()
    }

    fn check(tables: &mut Tables, table: RemoteTable) -> Result<(), MonitorError> {
        tables.calls.push(table);
        if tables.failing.contains(&table) {
            return Err(MonitorError::Remote {
                table: table.name().to_string(),
                message: "HTTP 503: unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn same_key(a: &Value, b: &Value, columns: &[&str]) -> bool {
    columns.iter().all(|c| a.get(c).is_some() && a.get(c) == b.get(c))
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn upsert(
        &self,
        table: RemoteTable,
        on_conflict: &str,
        rows: Vec<Value>,
    ) -> Result<(), MonitorError> {
        let mut tables = self.inner.write().await;
        Self::check(&mut tables, table)?;
        let columns: Vec<&str> = on_conflict.split(',').map(str::trim).collect();
        let stored = tables.rows.entry(table).or_default();
        for row in rows {
            match stored.iter_mut().find(|existing| same_key(existing, &row, &columns)) {
                Some(existing) => {
                    if let (Some(target), Value::Object(fields)) = (existing.as_object_mut(), row) {
                        target.extend(fields);
                    }
                }
                None => stored.push(row),
            }
        }
        Ok(())
    }

    async fn insert(&self, table: RemoteTable, rows: Vec<Value>) -> Result<(), MonitorError> {
        let mut tables = self.inner.write().await;
        Self::check(&mut tables, table)?;
        tables.rows.entry(table).or_default().extend(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn upsert_merges_on_conflict_key() {
        let store = MemoryRemoteStore::new();
        let first = json!({"account_name": "a", "balance": 1.0, "site": "x"});
        let second = json!({"account_name": "a", "balance": 2.0});
        for row in [first, second] {
            assert!(store.upsert(RemoteTable::Accounts, "account_name", vec![row]).await.is_ok());
        }
        let rows = store.rows(RemoteTable::Accounts).await;
        assert_eq!(rows, vec![json!({"account_name": "a", "balance": 2.0, "site": "x"})]);
    }

    #[tokio::test]
    async fn failing_table_counts_the_call() {
        let store = MemoryRemoteStore::new();
        store.fail_table(RemoteTable::Devices).await;
        let result = store
            .upsert(RemoteTable::Devices, "device_id", vec![json!({"device_id": "d"})])
            .await;
        assert!(matches!(result, Err(MonitorError::Remote { .. })));
        assert_eq!(store.call_count(RemoteTable::Devices).await, 1);
        assert!(store.rows(RemoteTable::Devices).await.is_empty());
    }
}
