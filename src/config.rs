//! Monitor configuration loaded from environment variables and the pools file.
//!
//! Follows 12-factor style: all process settings come from environment
//! variables (or a `.env` file via `dotenvy`). The set of pools to scrape
//! lives in a JSON file whose path is itself configurable.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PoolId, PoolIdentity, PoolRecord};
use crate::error::MonitorError;

/// Site label used for the remote account when a pool does not set one.
pub const DEFAULT_SITE: &str = "KZ Pool";

/// Company used for the remote account when a pool leaves it empty.
pub const DEFAULT_COMPANY: &str = "BTCDC Builds";

/// Pool id of the environment-described pool when `POOL_ID` is unset.
pub const ENV_POOL_ID: &str = "default";

/// Pool name of the environment-described pool when `POOL_NAME` is unset.
pub const ENV_POOL_NAME: &str = "Default Pool";

/// Top-level monitor configuration.
///
/// Loaded once at startup via [`MonitorConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// SQLite connection string (e.g. `sqlite://btcpool_data.db`).
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Path of the pools JSON file.
    pub pools_config_path: PathBuf,

    /// Pool described by `POOL_ID`/`OBSERVER_URL`/... variables, used
    /// when the pools file yields nothing.
    pub env_pool: Option<PoolConfig>,

    /// Remote backend settings; `None` disables synchronization.
    pub remote: Option<RemoteConfig>,

    /// Timeout in seconds for loading an observer page.
    pub page_timeout_secs: u64,

    /// Upper bound on pool pipelines running at the same time.
    pub max_concurrent_pools: usize,

    /// Socket address the read API binds to.
    pub listen_addr: SocketAddr,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

/// Connection settings for the PostgREST-style remote store.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Project base URL, without trailing slash.
    pub base_url: String,
    /// Service key sent as `apikey` and bearer token.
    pub service_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl MonitorConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Config`] if `LISTEN_ADDR` is set but cannot
    /// be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, MonitorError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| MonitorError::Config(format!("LISTEN_ADDR: {e}")))?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://btcpool_data.db".to_string());

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 5);
        let database_connect_timeout_secs = parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5);

        let pools_config_path = std::env::var("POOLS_CONFIG")
            .map_or_else(|_| PathBuf::from("pools_config.json"), PathBuf::from);

        let sync_enabled = parse_env_bool("SYNC_ENABLED", true);
        let remote = match (
            std::env::var("SUPABASE_URL").ok(),
            std::env::var("SUPABASE_SERVICE_KEY").ok(),
        ) {
            (Some(url), Some(key)) if sync_enabled && !url.is_empty() && !key.is_empty() => {
                Some(RemoteConfig {
                    base_url: url.trim_end_matches('/').to_string(),
                    service_key: key,
                    timeout_secs: parse_env("REMOTE_TIMEOUT_SECS", 30),
                })
            }
            _ => None,
        };

        let log_json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            database_max_connections,
            database_connect_timeout_secs,
            pools_config_path,
            env_pool: PoolConfig::from_env(),
            remote,
            page_timeout_secs: parse_env("PAGE_TIMEOUT_SECS", 60),
            max_concurrent_pools: parse_env("MAX_CONCURRENT_POOLS", 4_usize).max(1),
            listen_addr,
            log_json,
        })
    }
}

/// One pool entry in the pools JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Stable pool key.
    pub pool_id: String,
    /// Display name.
    #[serde(default)]
    pub pool_name: String,
    /// Observer dashboard URL.
    #[serde(default)]
    pub observer_url: String,
    /// Client the pool belongs to.
    #[serde(default)]
    pub client_name: String,
    /// Country.
    #[serde(default)]
    pub country: String,
    /// Owning company.
    #[serde(default)]
    pub company: String,
    /// Physical location.
    #[serde(default)]
    pub location: String,
    /// Contact email.
    #[serde(default)]
    pub contact_email: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the pool is scraped.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Remote account name; defaults to the pool id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Remote site label; defaults to [`DEFAULT_SITE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Informational scrape cadence, written on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_interval_minutes: Option<u32>,
    /// Creation timestamp, written on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp, written on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl PoolConfig {
    /// Converts the file entry into the identity record the store keeps.
    #[must_use]
    pub fn to_identity(&self) -> PoolIdentity {
        PoolIdentity {
            pool_id: PoolId::new(self.pool_id.clone()),
            pool_name: self.pool_name.clone(),
            observer_url: self.observer_url.clone(),
            client_name: self.client_name.clone(),
            country: self.country.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
            contact_email: self.contact_email.clone(),
            tags: self.tags.clone(),
            active: self.active,
        }
    }

    /// Remote account name for this pool. Empty falls back to the pool id.
    #[must_use]
    pub fn account_name(&self) -> &str {
        self.account_name
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.pool_id)
    }

    /// Remote site label for this pool.
    #[must_use]
    pub fn site(&self) -> &str {
        self.site
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SITE)
    }

    /// Single pool described by the process environment.
    ///
    /// Reads `POOL_ID`, `POOL_NAME`, `OBSERVER_URL`, `CLIENT_NAME`,
    /// `COUNTRY`, `COMPANY`, `LOCATION` and `CONTACT_EMAIL`. Returns `None`
    /// when `OBSERVER_URL` is unset or empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`PoolConfig::from_env`], reading variables through `var`.
    #[must_use]
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let observer_url = var("OBSERVER_URL").filter(|u| !u.trim().is_empty())?;
        let or_empty = |key: &str| var(key).unwrap_or_default();
        Some(Self {
            pool_id: var("POOL_ID")
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| ENV_POOL_ID.to_string()),
            pool_name: var("POOL_NAME").unwrap_or_else(|| ENV_POOL_NAME.to_string()),
            observer_url,
            client_name: or_empty("CLIENT_NAME"),
            country: or_empty("COUNTRY"),
            company: or_empty("COMPANY"),
            location: or_empty("LOCATION"),
            contact_email: or_empty("CONTACT_EMAIL"),
            tags: Vec::new(),
            active: true,
            account_name: None,
            site: None,
            scrape_interval_minutes: None,
            created_at: None,
            updated_at: None,
        })
    }
}

impl From<PoolRecord> for PoolConfig {
    fn from(record: PoolRecord) -> Self {
        let PoolIdentity {
            pool_id,
            pool_name,
            observer_url,
            client_name,
            country,
            company,
            location,
            contact_email,
            tags,
            active,
        } = record.identity;
        Self {
            pool_id: pool_id.as_str().to_string(),
            pool_name,
            observer_url,
            client_name,
            country,
            company,
            location,
            contact_email,
            tags,
            active,
            account_name: None,
            site: None,
            scrape_interval_minutes: None,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }
}

/// File-level metadata block of the pools JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsFileMetadata {
    /// Format version.
    pub version: String,
    /// Time of the last export.
    pub last_updated: DateTime<Utc>,
    /// Number of pools in the file.
    pub total_pools: usize,
}

/// The pools JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsFile {
    /// Configured pools.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
    /// Optional export metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PoolsFileMetadata>,
}

impl PoolsFile {
    /// Loads the pool list from `path`.
    ///
    /// A missing file or invalid JSON yields an empty list and a warning;
    /// the caller decides whether an empty list is acceptable.
    pub async fn load_pools(path: &Path) -> Vec<PoolConfig> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "pools config not readable");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(file) => file.pools,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid pools config JSON");
                Vec::new()
            }
        }
    }

    /// Loads the pool list from `path`, falling back to `env_pool` when
    /// the file is missing, invalid or lists no pools.
    pub async fn load_or_env(path: &Path, env_pool: Option<&PoolConfig>) -> Vec<PoolConfig> {
        let pools = Self::load_pools(path).await;
        if !pools.is_empty() {
            return pools;
        }
        match env_pool {
            Some(pool) => {
                tracing::info!(
                    pool_id = %pool.pool_id,
                    "no pools in config file, using environment pool"
                );
                vec![pool.clone()]
            }
            None => pools,
        }
    }

    /// Writes the file as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Internal`] if serialization or the write fails.
    pub async fn write(&self, path: &Path) -> Result<(), MonitorError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MonitorError::Internal(format!("serialize pools file: {e}")))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| MonitorError::Internal(format!("write {}: {e}", path.display())))
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn pool_entry_defaults() {
        let json = r#"{"pools":[{"pool_id":"kz-01","observer_url":"https://example.test/o"}]}"#;
        let Ok(file) = serde_json::from_str::<PoolsFile>(json) else {
            panic!("parse failed");
        };
        let Some(pool) = file.pools.first() else {
            panic!("expected one pool");
        };
        assert!(pool.active);
        assert_eq!(pool.account_name(), "kz-01");
        assert_eq!(pool.site(), DEFAULT_SITE);
        assert!(pool.tags.is_empty());
    }

    #[test]
    fn explicit_account_name_wins() {
        let json = r#"{"pool_id":"kz-01","account_name":"acct-a","active":false}"#;
        let Ok(pool) = serde_json::from_str::<PoolConfig>(json) else {
            panic!("parse failed");
        };
        assert_eq!(pool.account_name(), "acct-a");
        assert!(!pool.to_identity().active);
    }

    #[test]
    fn empty_overrides_fall_back() {
        let json = r#"{"pool_id":"kz-01","account_name":"","site":""}"#;
        let Ok(pool) = serde_json::from_str::<PoolConfig>(json) else {
            panic!("parse failed");
        };
        assert_eq!(pool.account_name(), "kz-01");
        assert_eq!(pool.site(), DEFAULT_SITE);
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn environment_pool_needs_observer_url() {
        assert!(PoolConfig::from_vars(vars(&[("POOL_ID", "kz-09")])).is_none());
        assert!(PoolConfig::from_vars(vars(&[("OBSERVER_URL", " ")])).is_none());
    }

    #[test]
    fn environment_pool_reads_identity_vars() {
        let Some(pool) = PoolConfig::from_vars(vars(&[
            ("POOL_ID", "kz-09"),
            ("OBSERVER_URL", "https://example.test/o"),
            ("CLIENT_NAME", "Client B"),
            ("COUNTRY", "Kazakhstan"),
            ("CONTACT_EMAIL", "ops@example.test"),
        ])) else {
            panic!("expected a pool");
        };
        assert_eq!(pool.pool_id, "kz-09");
        assert_eq!(pool.pool_name, ENV_POOL_NAME);
        assert_eq!(pool.client_name, "Client B");
        assert_eq!(pool.contact_email, "ops@example.test");
        assert!(pool.company.is_empty());
        assert!(pool.active);

        let Some(unnamed) = PoolConfig::from_vars(vars(&[("OBSERVER_URL", "https://example.test/o")]))
        else {
            panic!("expected a pool");
        };
        assert_eq!(unnamed.pool_id, ENV_POOL_ID);
    }

    #[tokio::test]
    async fn missing_file_uses_environment_pool() {
        let path = Path::new("/nonexistent/pools_config.json");
        let env_pool = PoolConfig::from_vars(vars(&[("OBSERVER_URL", "https://example.test/o")]));
        let pools = PoolsFile::load_or_env(path, env_pool.as_ref()).await;
        assert_eq!(pools.len(), 1);
        assert!(PoolsFile::load_or_env(path, None).await.is_empty());
    }

    #[tokio::test]
    async fn file_pools_win_over_environment_pool() {
        let path = std::env::temp_dir().join(format!("pools-{}.json", uuid::Uuid::new_v4()));
        let json = r#"{"pools":[{"pool_id":"kz-01"},{"pool_id":"kz-02"}]}"#;
        if let Err(e) = tokio::fs::write(&path, json).await {
            panic!("write failed: {e}");
        }
        let env_pool = PoolConfig::from_vars(vars(&[("OBSERVER_URL", "https://example.test/o")]));
        let pools = PoolsFile::load_or_env(&path, env_pool.as_ref()).await;
        let _ = tokio::fs::remove_file(&path).await;
        let ids: Vec<&str> = pools.iter().map(|p| p.pool_id.as_str()).collect();
        assert_eq!(ids, ["kz-01", "kz-02"]);
    }

    #[tokio::test]
    async fn missing_file_yields_no_pools() {
        let pools = PoolsFile::load_pools(Path::new("/nonexistent/pools_config.json")).await;
        assert!(pools.is_empty());
    }
}
