//! Structured records extracted from one observer page load.
//!
//! A [`ScrapedSnapshot`] is the extractor's output and the persister's
//! input: display strings exactly as the page showed them. Numeric values
//! are derived later by [`crate::normalize`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Summary fields the dashboard exposes as label/value line pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryField {
    /// Current pool hashrate.
    CurrentHashrate,
    /// 24-hour average hashrate.
    AvgHashrate24h,
    /// Number of online workers.
    OnlineWorkers,
    /// Number of offline workers.
    OfflineWorkers,
    /// Account balance.
    Balance,
    /// Most recent income payment.
    LastIncome,
}

impl SummaryField {
    /// Column-style name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CurrentHashrate => "current_hashrate",
            Self::AvgHashrate24h => "avg_hashrate_24h",
            Self::OnlineWorkers => "online_workers",
            Self::OfflineWorkers => "offline_workers",
            Self::Balance => "balance",
            Self::LastIncome => "last_income",
        }
    }
}

/// Label-matched summary values, keyed by field.
pub type SummaryMap = BTreeMap<SummaryField, String>;

/// Worker state as reported by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkerStatus {
    /// Worker is submitting shares.
    Online,
    /// Worker stopped submitting shares.
    Offline,
}

impl WorkerStatus {
    /// Dashboard spelling (`ONLINE` / `OFFLINE`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerStatus {
    type Err = String;

    /// Exact, case-sensitive match; anything else (e.g. `DEGRADED`) is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(Self::Online),
            "OFFLINE" => Ok(Self::Offline),
            other => Err(format!("unknown worker status: {other}")),
        }
    }
}

/// One worker row accepted from a worker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCandidate {
    /// Worker name, never empty.
    pub name: String,
    /// Reported status.
    pub status: WorkerStatus,
    /// 10-minute hashrate display string.
    pub hashrate_10m: String,
    /// 1-hour hashrate display string.
    pub hashrate_1h: String,
    /// 24-hour hashrate display string.
    pub hashrate_24h: String,
    /// Last share exchange, absent when the row has no sixth cell.
    pub last_exchange_time: Option<String>,
}

/// One row accepted from an earnings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningCandidate {
    /// Calendar date as displayed (`D/M/YYYY`).
    pub date: String,
    /// Total income display string.
    pub total_income: String,
    /// Hashrate display string for that day.
    pub hashrate: String,
}

/// Everything extracted from one page load. Any part may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedSnapshot {
    /// Summary values keyed by field.
    pub summary: SummaryMap,
    /// Accepted worker rows in table order.
    pub workers: Vec<WorkerCandidate>,
    /// Accepted earnings rows in table order.
    pub earnings: Vec<EarningCandidate>,
}

impl ScrapedSnapshot {
    /// Display value of a summary field, if the page had it.
    #[must_use]
    pub fn field(&self, field: SummaryField) -> Option<&str> {
        self.summary.get(&field).map(String::as_str)
    }

    /// Names of workers currently reported offline, in table order.
    pub fn offline_worker_names(&self) -> impl Iterator<Item = &str> {
        self.workers
            .iter()
            .filter(|w| w.status == WorkerStatus::Offline)
            .map(|w| w.name.as_str())
    }
}
