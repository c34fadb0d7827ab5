//! Entities of the remote backend schema.
//!
//! The remote store keeps the same facts as the local tables, reshaped
//! around an account name instead of a pool id. These types are the JSON
//! bodies sent to it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Prefix of every derived device identity.
pub const DEVICE_ID_PREFIX: &str = "KZ";

/// Tables of the remote schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteTable {
    /// Account directory, upserted by `account_name`.
    Accounts,
    /// Append-only hashrate samples.
    Hashrates,
    /// Device directory, upserted by `device_id`.
    Devices,
    /// Daily income entries.
    IncomeTracking,
    /// Open alerts, upserted by `account_name`.
    Alerts,
}

impl RemoteTable {
    /// Table name in the remote schema.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Hashrates => "hashrates",
            Self::Devices => "devices",
            Self::IncomeTracking => "income_tracking",
            Self::Alerts => "alerts",
        }
    }

    /// Natural key used to merge upserts, if the table is upserted.
    #[must_use]
    pub const fn conflict_key(self) -> Option<&'static str> {
        match self {
            Self::Accounts | Self::Alerts => Some("account_name"),
            Self::Devices => Some("device_id"),
            Self::Hashrates | Self::IncomeTracking => None,
        }
    }
}

impl fmt::Display for RemoteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derives the remote device identity of a worker.
///
/// `{prefix}_{account}_{worker}` with every whitespace character replaced
/// by `_`. Distinct worker names that differ only in whitespace collide.
#[must_use]
pub fn device_id(account_name: &str, worker_name: &str) -> String {
    format!("{DEVICE_ID_PREFIX}_{account_name}_{worker_name}")
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Account row, merged on `account_name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteAccount {
    /// Natural key.
    pub account_name: String,
    /// Always `"BTC"`.
    pub coin_type: String,
    /// Always `true` for accounts being synchronized.
    pub is_active: bool,
    /// Owning company.
    pub company: String,
    /// Site label.
    pub site: String,
    /// Always `"kzpool"`.
    pub account_type: String,
    /// Client grouping.
    pub group_name: String,
    /// Current balance in BTC, when parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    /// Most recent income in BTC, when parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earn_24_hours: Option<f64>,
    /// Sync time.
    pub updated_at: DateTime<Utc>,
}

/// Append-only hashrate sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteHashrateSample {
    /// Owning account.
    pub account_name: String,
    /// Current hashrate, TH/s.
    pub hashrate_10m: f64,
    /// Current hashrate, TH/s.
    pub hashrate_1h: f64,
    /// 24-hour average hashrate, TH/s.
    pub hashrate_1d: f64,
    /// Online plus offline workers.
    pub worker_count: u32,
    /// Online workers.
    pub active_workers: u32,
    /// Not reported by the dashboard; always zero.
    pub reject_rate: f64,
    /// Sample time.
    pub timestamp: DateTime<Utc>,
    /// Insert time.
    pub created_at: DateTime<Utc>,
}

/// Device row, merged on `device_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteDevice {
    /// Derived identity, see [`device_id`].
    pub device_id: String,
    /// The worker name; the dashboard exposes no serial.
    pub serial_number: String,
    /// Owning account.
    pub account_name: String,
    /// Worker name as displayed.
    pub worker_name: String,
    /// Always `"ASIC"`.
    pub device_type: String,
    /// `online` / `offline`.
    pub status: String,
    /// Unknown to the dashboard.
    pub manufacturer: String,
    /// Unknown to the dashboard.
    pub model: String,
    /// Site label.
    pub site: String,
    /// Country of the pool.
    pub location: String,
    /// Sync time.
    pub created_at: DateTime<Utc>,
    /// Sync time.
    pub updated_at: DateTime<Utc>,
}

/// Daily income entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteIncomeRecord {
    /// Owning account.
    pub account_name: String,
    /// Date as displayed on the dashboard.
    pub date: String,
    /// Income in BTC.
    pub btc_amount: f64,
    /// Not known at sync time; always zero.
    pub usd_value: f64,
    /// Site label.
    pub source: String,
    /// Always `"mining_reward"`.
    pub transaction_type: String,
    /// Sync time.
    pub created_at: DateTime<Utc>,
}

/// Offline-worker alert, merged on `account_name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteAlert {
    /// Owning account.
    pub account_name: String,
    /// Always `"offline_workers"`.
    pub alert_type: String,
    /// `medium` / `high`.
    pub severity: String,
    /// Human-readable message.
    pub message: String,
    /// Always `false` on creation.
    pub resolved: bool,
    /// Sync time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_replaces_whitespace() {
        assert_eq!(device_id("acct-a", "Rig 01"), "KZ_acct-a_Rig_01");
        assert_eq!(device_id("acct-a", "Rig 01"), device_id("acct-a", "Rig 01"));
        assert_eq!(device_id("my acct", "r\t1"), "KZ_my_acct_r_1");
    }

    #[test]
    fn whitespace_variants_collide() {
        assert_eq!(device_id("a", "Rig 01"), device_id("a", "Rig_01"));
    }

    #[test]
    fn only_directory_tables_have_conflict_keys() {
        assert_eq!(RemoteTable::Accounts.conflict_key(), Some("account_name"));
        assert_eq!(RemoteTable::Devices.conflict_key(), Some("device_id"));
        assert_eq!(RemoteTable::Hashrates.conflict_key(), None);
        assert_eq!(RemoteTable::IncomeTracking.name(), "income_tracking");
    }
}
