//! Type-safe pool identifier.
//!
//! [`PoolId`] is a newtype around the operator-chosen pool key (e.g.
//! `"kz-01"`) so that pool identifiers cannot be confused with account
//! names, worker names or other free-form strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key of a monitored pool.
///
/// Chosen by the operator in the pools file and immutable thereafter.
/// Every row the monitor writes references it as a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(String);

impl PoolId {
    /// Wraps an existing pool key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoolId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PoolId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for PoolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_key() {
        let id = PoolId::new("kz-01");
        assert_eq!(format!("{id}"), "kz-01");
    }

    #[test]
    fn serializes_transparently() {
        let id = PoolId::from("kz-01");
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"kz-01\"");
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = PoolId::new("a");
        let mut map = HashMap::new();
        map.insert(id.clone(), "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }
}
