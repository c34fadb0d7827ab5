//! Label vocabulary and table classification.
//!
//! The dashboard is matched by wording, so every phrase the extractor
//! looks for lives in a [`Vocabulary`]. A locale or markup change is a
//! data change here (or a different [`PageMatcher`]), not a code change in
//! the extractor.

use serde::{Deserialize, Serialize};

use super::page::PageTable;
use crate::domain::SummaryField;

/// What a table holds, as far as the matcher can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Per-worker status rows.
    Workers,
    /// Per-day earnings rows.
    Earnings,
    /// Anything else; ignored.
    Other,
}

/// Decides which lines are summary labels and what tables contain.
pub trait PageMatcher: Send + Sync + std::fmt::Debug {
    /// Field labelled by `line`, given the line that follows it.
    fn summary_field(&self, line: &str, next: &str) -> Option<SummaryField>;

    /// Classification of a table.
    fn classify_table(&self, table: &PageTable) -> TableKind;
}

/// How a label line is compared with the vocabulary phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// The trimmed line contains the phrase.
    Contains,
    /// The trimmed line equals the phrase.
    Exact,
}

/// One label phrase for a summary field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    /// Field the label introduces.
    pub field: SummaryField,
    /// Phrase to look for.
    pub phrase: String,
    /// Comparison mode.
    pub mode: LabelMatch,
    /// The value line must contain this token for the label to count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_contains: Option<String>,
}

impl LabelRule {
    fn contains(field: SummaryField, phrase: &str) -> Self {
        Self {
            field,
            phrase: phrase.to_string(),
            mode: LabelMatch::Contains,
            value_contains: None,
        }
    }

    fn exact_with_value(field: SummaryField, phrase: &str, token: &str) -> Self {
        Self {
            field,
            phrase: phrase.to_string(),
            mode: LabelMatch::Exact,
            value_contains: Some(token.to_string()),
        }
    }

    fn matches(&self, line: &str, next: &str) -> bool {
        let label_ok = match self.mode {
            LabelMatch::Contains => line.contains(&self.phrase),
            LabelMatch::Exact => line == self.phrase,
        };
        label_ok
            && self
                .value_contains
                .as_deref()
                .is_none_or(|token| next.contains(token))
    }
}

/// Data-driven [`PageMatcher`].
///
/// The default covers the Russian and English variants of the observer
/// dashboard. Can be loaded from JSON for other locales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Summary label rules, tried in order.
    pub summary_labels: Vec<LabelRule>,
    /// Header words marking a worker table.
    pub worker_header_words: Vec<String>,
    /// Body tokens marking a worker table.
    pub worker_body_tokens: Vec<String>,
    /// Header words marking an earnings table.
    pub earnings_header_words: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        use SummaryField as F;
        let words = |list: &[&str]| -> Vec<String> { list.iter().map(|w| (*w).to_string()).collect() };
        Self {
            summary_labels: vec![
                LabelRule::contains(F::CurrentHashrate, "Текущий хешрейт"),
                LabelRule::contains(F::CurrentHashrate, "Current hashrate"),
                LabelRule::contains(F::AvgHashrate24h, "Средний хешрейт за 24ч"),
                LabelRule::contains(F::AvgHashrate24h, "24h average hashrate"),
                LabelRule::contains(F::AvgHashrate24h, "Average hashrate (24h)"),
                LabelRule::contains(F::OnlineWorkers, "Онлайн воркеры"),
                LabelRule::contains(F::OnlineWorkers, "Online workers"),
                LabelRule::contains(F::OfflineWorkers, "Оффлайн воркеры"),
                LabelRule::contains(F::OfflineWorkers, "Offline workers"),
                LabelRule::exact_with_value(F::Balance, "Баланс", "BTC"),
                LabelRule::exact_with_value(F::Balance, "Balance", "BTC"),
                LabelRule::contains(F::LastIncome, "Последний доход"),
                LabelRule::contains(F::LastIncome, "Last income"),
            ],
            worker_header_words: words(&["Воркеры", "Статус", "Workers", "Status"]),
            worker_body_tokens: words(&["ONLINE", "OFFLINE"]),
            earnings_header_words: words(&[
                "Доходы",
                "Дата",
                "Общий доход",
                "Earnings",
                "Date",
                "Total income",
            ]),
        }
    }
}

impl PageMatcher for Vocabulary {
    fn summary_field(&self, line: &str, next: &str) -> Option<SummaryField> {
        self.summary_labels
            .iter()
            .find(|rule| rule.matches(line, next))
            .map(|rule| rule.field)
    }

    fn classify_table(&self, table: &PageTable) -> TableKind {
        let header_has =
            |words: &[String]| words.iter().any(|w| table.header_text.contains(w.as_str()));
        let body_has = self.worker_body_tokens.iter().any(|t| {
            table.body_text.contains(t.as_str()) || table.header_text.contains(t.as_str())
        });
        if header_has(&self.worker_header_words) || body_has {
            TableKind::Workers
        } else if header_has(&self.earnings_header_words) {
            TableKind::Earnings
        } else {
            TableKind::Other
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn table(header: &str, rows: &[&[&str]]) -> PageTable {
        PageTable::from_rows(
            header,
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn labels_match_both_locales() {
        let v = Vocabulary::default();
        assert_eq!(v.summary_field("Online workers", "42"), Some(SummaryField::OnlineWorkers));
        assert_eq!(v.summary_field("Онлайн воркеры", "42"), Some(SummaryField::OnlineWorkers));
        assert_eq!(v.summary_field("Оффлайн воркеры", "7"), Some(SummaryField::OfflineWorkers));
        assert_eq!(v.summary_field("Nothing here", "7"), None);
    }

    #[test]
    fn balance_requires_exact_label_and_currency_value() {
        let v = Vocabulary::default();
        assert_eq!(v.summary_field("Баланс", "0.01 BTC"), Some(SummaryField::Balance));
        assert_eq!(v.summary_field("Баланс", "pending"), None);
        assert_eq!(v.summary_field("Баланс аккаунта", "0.01 BTC"), None);
    }

    #[test]
    fn worker_tables_by_header_or_status_tokens() {
        let v = Vocabulary::default();
        assert_eq!(v.classify_table(&table("Воркеры", &[])), TableKind::Workers);
        assert_eq!(v.classify_table(&table("", &[&["rig", "ONLINE"]])), TableKind::Workers);
        assert_eq!(v.classify_table(&table("Дата Общий доход", &[])), TableKind::Earnings);
        assert_eq!(v.classify_table(&table("Misc", &[&["x"]])), TableKind::Other);
    }

    #[test]
    fn custom_vocabulary_loads_from_json() {
        let json = r#"{
            "summary_labels": [
                {"field": "offline_workers", "phrase": "Offline-Worker", "mode": "contains"}
            ],
            "worker_header_words": ["Miner"],
            "worker_body_tokens": ["ONLINE", "OFFLINE"],
            "earnings_header_words": ["Datum"]
        }"#;
        let Ok(v) = serde_json::from_str::<Vocabulary>(json) else {
            panic!("vocabulary should parse");
        };
        assert_eq!(v.summary_field("Offline-Worker", "3"), Some(SummaryField::OfflineWorkers));
        assert_eq!(v.summary_field("Offline workers", "3"), None);
        assert_eq!(v.classify_table(&table("Datum", &[])), TableKind::Earnings);
    }
}
