//! Anomaly rules and the records they produce.
//!
//! The threshold logic lives here once. The local anomaly log and the
//! remote alert both consume [`offline_workers_severity`], so the two
//! surfaces cannot disagree on severity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Offline counts strictly above this are [`Severity::High`].
pub const OFFLINE_HIGH_THRESHOLD: u32 = 5;

/// Maximum number of offline worker names quoted in a description.
pub const OFFLINE_NAMES_IN_DESCRIPTION: usize = 5;

/// Number of most recent snapshots the hashrate-drop rule looks at,
/// the newest one included.
pub const HASHRATE_HISTORY_WINDOW: u32 = 10;

/// The rule fires when current hashrate falls below this share of the
/// reference average.
pub const HASHRATE_DROP_RATIO: f64 = 0.8;

/// Drops strictly above this percentage are [`Severity::High`].
pub const HASHRATE_HIGH_DROP_PERCENT: f64 = 30.0;

/// Which rule produced an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// One or more workers reported offline.
    OfflineWorkers,
    /// Current hashrate fell well below the recent average.
    HashrateDrop,
}

impl AnomalyKind {
    /// Stored spelling (`OFFLINE_WORKERS` / `HASHRATE_DROP`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OfflineWorkers => "OFFLINE_WORKERS",
            Self::HashrateDrop => "HASHRATE_DROP",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnomalyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFLINE_WORKERS" => Ok(Self::OfflineWorkers),
            "HASHRATE_DROP" => Ok(Self::HashrateDrop),
            other => Err(format!("unknown anomaly type: {other}")),
        }
    }
}

/// Ordinal urgency of an anomaly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Needs attention.
    Medium,
    /// Needs attention now.
    High,
}

impl Severity {
    /// Stored spelling (`MEDIUM` / `HIGH`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Remote-store spelling (`medium` / `high`).
    #[must_use]
    pub const fn as_remote_str(self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// A fired rule, ready to be appended to the anomaly log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Rule that fired.
    pub kind: AnomalyKind,
    /// Urgency.
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
}

/// Severity of an offline-worker condition, `None` when nothing is offline.
///
/// Shared by the local anomaly log and the remote alert.
#[must_use]
pub const fn offline_workers_severity(offline_count: u32) -> Option<Severity> {
    if offline_count == 0 {
        None
    } else if offline_count > OFFLINE_HIGH_THRESHOLD {
        Some(Severity::High)
    } else {
        Some(Severity::Medium)
    }
}

/// Offline-worker rule.
///
/// Fires when `offline_count > 0`; the description quotes up to
/// [`OFFLINE_NAMES_IN_DESCRIPTION`] of the given worker names.
pub fn assess_offline_workers<'a>(
    offline_count: u32,
    offline_names: impl IntoIterator<Item = &'a str>,
) -> Option<Anomaly> {
    let severity = offline_workers_severity(offline_count)?;
    let names: Vec<&str> = offline_names
        .into_iter()
        .take(OFFLINE_NAMES_IN_DESCRIPTION)
        .collect();
    Some(Anomaly {
        kind: AnomalyKind::OfflineWorkers,
        severity,
        description: format!("{offline_count} worker(s) offline: {}", names.join(", ")),
    })
}

/// Result of a fired hashrate-drop rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashrateDrop {
    /// Newest normalized hashrate, TH/s.
    pub current_ths: f64,
    /// Mean of the older rows, TH/s.
    pub reference_average_ths: f64,
    /// `(reference - current) / reference × 100`.
    pub drop_percent: f64,
    /// Urgency.
    pub severity: Severity,
}

impl HashrateDrop {
    /// Builds the log record, quoting the current value as displayed.
    #[must_use]
    pub fn into_anomaly(self, current_display: &str) -> Anomaly {
        Anomaly {
            kind: AnomalyKind::HashrateDrop,
            severity: self.severity,
            description: format!(
                "Hashrate dropped {:.1}% (Current: {current_display}, Avg: {:.2} TH/s)",
                self.drop_percent, self.reference_average_ths
            ),
        }
    }
}

/// Hashrate-drop rule over normalized values ordered newest first.
///
/// The newest value is the current one; the reference average is taken
/// over the remaining values only. Fewer than two values never fire.
#[must_use]
pub fn assess_hashrate_drop(recent_newest_first: &[f64]) -> Option<HashrateDrop> {
    let (&current, history) = recent_newest_first.split_first()?;
    if history.is_empty() {
        return None;
    }
    let reference = history.iter().sum::<f64>() / history.len() as f64;
    if current >= reference * HASHRATE_DROP_RATIO {
        return None;
    }
    // Multiply before dividing so round percentages stay exact.
    let drop_percent = (reference - current) * 100.0 / reference;
    let severity = if drop_percent > HASHRATE_HIGH_DROP_PERCENT {
        Severity::High
    } else {
        Severity::Medium
    };
    Some(HashrateDrop {
        current_ths: current,
        reference_average_ths: reference,
        drop_percent,
        severity,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn offline_threshold_is_strictly_above_five() {
        assert_eq!(offline_workers_severity(0), None);
        assert_eq!(offline_workers_severity(1), Some(Severity::Medium));
        assert_eq!(offline_workers_severity(5), Some(Severity::Medium));
        assert_eq!(offline_workers_severity(6), Some(Severity::High));
    }

    #[test]
    fn offline_description_quotes_at_most_five_names() {
        let names = ["w1", "w2", "w3", "w4", "w5", "w6", "w7"];
        let Some(anomaly) = assess_offline_workers(7, names) else {
            panic!("rule should fire");
        };
        assert_eq!(anomaly.kind, AnomalyKind::OfflineWorkers);
        assert_eq!(anomaly.severity, Severity::High);
        assert_eq!(anomaly.description, "7 worker(s) offline: w1, w2, w3, w4, w5");
    }

    #[test]
    fn offline_rule_silent_at_zero() {
        assert!(assess_offline_workers(0, ["w1"]).is_none());
    }

    #[test]
    fn single_row_never_fires() {
        assert!(assess_hashrate_drop(&[0.0]).is_none());
        assert!(assess_hashrate_drop(&[]).is_none());
    }

    #[test]
    fn reference_excludes_newest_row() {
        // Including the newest row would give avg 85 and no drop below 80%.
        let Some(drop) = assess_hashrate_drop(&[70.0, 100.0]) else {
            panic!("rule should fire");
        };
        assert_eq!(drop.reference_average_ths, 100.0);
        assert_eq!(drop.drop_percent, 30.0);
        assert_eq!(drop.severity, Severity::Medium);
    }

    #[test]
    fn large_drop_is_high() {
        let Some(drop) = assess_hashrate_drop(&[50.0, 100.0, 100.0]) else {
            panic!("rule should fire");
        };
        assert_eq!(drop.severity, Severity::High);
        let anomaly = drop.into_anomaly("50 TH/s");
        assert_eq!(
            anomaly.description,
            "Hashrate dropped 50.0% (Current: 50 TH/s, Avg: 100.00 TH/s)"
        );
    }

    #[test]
    fn exactly_eighty_percent_does_not_fire() {
        assert!(assess_hashrate_drop(&[80.0, 100.0]).is_none());
    }

    #[test]
    fn zero_history_does_not_fire() {
        assert!(assess_hashrate_drop(&[0.0, 0.0, 0.0]).is_none());
    }
}
