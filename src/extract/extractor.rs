//! Turns page text and tables into a [`ScrapedSnapshot`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::page::{PageContent, PageTable};
use super::vocabulary::{PageMatcher, TableKind, Vocabulary};
use crate::domain::{EarningCandidate, ScrapedSnapshot, WorkerCandidate, WorkerStatus};

/// Minimum cells for a worker row: name, status, three hashrate windows.
pub const WORKER_MIN_CELLS: usize = 5;

/// Minimum cells for an earnings row: date, income, hashrate.
pub const EARNING_MIN_CELLS: usize = 3;

#[allow(clippy::expect_used)]
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").expect("date pattern is valid"));

/// How much of the page the vocabulary recognized.
///
/// An empty snapshot with zero coverage usually means the dashboard
/// wording changed, not that the pool has no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionCoverage {
    /// Lines of visible text scanned.
    pub lines_scanned: usize,
    /// Distinct summary fields found.
    pub summary_fields: usize,
    /// Tables on the page.
    pub tables_seen: usize,
    /// Tables classified as worker tables.
    pub worker_tables: usize,
    /// Tables classified as earnings tables.
    pub earnings_tables: usize,
    /// Worker rows dropped (too short, empty name, unknown status).
    pub worker_rows_rejected: usize,
    /// Earnings rows dropped (too short, malformed date).
    pub earning_rows_rejected: usize,
}

impl ExtractionCoverage {
    /// `true` when no label or table matched at all.
    #[must_use]
    pub const fn matched_nothing(&self) -> bool {
        self.summary_fields == 0 && self.worker_tables == 0 && self.earnings_tables == 0
    }
}

/// Extractor output: the snapshot plus what was recognized.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Extracted records.
    pub snapshot: ScrapedSnapshot,
    /// Match statistics.
    pub coverage: ExtractionCoverage,
}

/// Vocabulary-driven page extractor.
///
/// Never fails: structurally absent data yields empty parts.
#[derive(Debug, Clone, Default)]
pub struct Extractor<M = Vocabulary> {
    matcher: M,
}

impl<M: PageMatcher> Extractor<M> {
    /// Creates an extractor using the given matcher.
    #[must_use]
    pub const fn new(matcher: M) -> Self {
        Self { matcher }
    }

    /// Extracts summary, worker and earnings records from a page.
    #[must_use]
    pub fn extract(&self, page: &PageContent) -> Extraction {
        let mut out = Extraction::default();
        self.extract_summary(&page.text, &mut out);

        out.coverage.tables_seen = page.tables.len();
        for table in page.tables.iter().filter(|t| !t.rows.is_empty()) {
            match self.matcher.classify_table(table) {
                TableKind::Workers => {
                    out.coverage.worker_tables += 1;
                    extract_workers(table, &mut out);
                }
                TableKind::Earnings => {
                    out.coverage.earnings_tables += 1;
                    extract_earnings(table, &mut out);
                }
                TableKind::Other => {}
            }
        }
        out
    }

    /// A label line's value is the line right after it. Later labels for
    /// the same field overwrite earlier ones.
    fn extract_summary(&self, text: &str, out: &mut Extraction) {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        out.coverage.lines_scanned = lines.len();
        for pair in lines.windows(2) {
            let [line, next] = pair else { continue };
            if let Some(field) = self.matcher.summary_field(line, next) {
                out.snapshot.summary.insert(field, (*next).to_string());
            }
        }
        out.coverage.summary_fields = out.snapshot.summary.len();
    }
}

fn cell(cells: &[String], idx: usize) -> Option<String> {
    cells.get(idx).map(|c| c.trim().to_string())
}

fn extract_workers(table: &PageTable, out: &mut Extraction) {
    for cells in &table.rows {
        match parse_worker_row(cells) {
            Some(worker) => out.snapshot.workers.push(worker),
            None => out.coverage.worker_rows_rejected += 1,
        }
    }
}

fn parse_worker_row(cells: &[String]) -> Option<WorkerCandidate> {
    if cells.len() < WORKER_MIN_CELLS {
        return None;
    }
    let name = cell(cells, 0).filter(|n| !n.is_empty())?;
    let status: WorkerStatus = cell(cells, 1)?.parse().ok()?;
    Some(WorkerCandidate {
        name,
        status,
        hashrate_10m: cell(cells, 2)?,
        hashrate_1h: cell(cells, 3)?,
        hashrate_24h: cell(cells, 4)?,
        last_exchange_time: cell(cells, 5),
    })
}

fn extract_earnings(table: &PageTable, out: &mut Extraction) {
    for cells in &table.rows {
        match parse_earning_row(cells) {
            Some(earning) => out.snapshot.earnings.push(earning),
            None => out.coverage.earning_rows_rejected += 1,
        }
    }
}

fn parse_earning_row(cells: &[String]) -> Option<EarningCandidate> {
    if cells.len() < EARNING_MIN_CELLS {
        return None;
    }
    let date = cell(cells, 0).filter(|d| DATE_RE.is_match(d))?;
    Some(EarningCandidate {
        date,
        total_income: cell(cells, 1)?,
        hashrate: cell(cells, 2)?,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SummaryField;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    fn extractor() -> Extractor {
        Extractor::new(Vocabulary::default())
    }

    #[test]
    fn summary_takes_the_following_line() {
        let page = PageContent {
            text: "Dashboard\nOnline workers\n42\nOffline workers\n7\nCurrent hashrate\n1.2 PH/s"
                .to_string(),
            tables: Vec::new(),
        };
        let out = extractor().extract(&page);
        assert_eq!(out.snapshot.field(SummaryField::OnlineWorkers), Some("42"));
        assert_eq!(out.snapshot.field(SummaryField::OfflineWorkers), Some("7"));
        assert_eq!(out.snapshot.field(SummaryField::CurrentHashrate), Some("1.2 PH/s"));
        assert_eq!(out.coverage.summary_fields, 3);
    }

    #[test]
    fn trailing_label_is_omitted() {
        let page = PageContent {
            text: "Online workers\n42\nOffline workers".to_string(),
            tables: Vec::new(),
        };
        let out = extractor().extract(&page);
        assert_eq!(out.snapshot.field(SummaryField::OfflineWorkers), None);
        assert_eq!(out.snapshot.summary.len(), 1);
    }

    #[test]
    fn degraded_status_is_dropped() {
        let table = PageTable::from_rows(
            "Воркеры",
            vec![
                row(&["rig-1", "ONLINE", "100 TH/s", "99 TH/s", "98 TH/s", "12:00"]),
                row(&["rig-2", "DEGRADED", "100 TH/s", "99 TH/s", "98 TH/s", "12:00"]),
                row(&["", "OFFLINE", "0", "0", "0"]),
                row(&["rig-3", "OFFLINE", "0 H/s", "0 H/s", "5 TH/s"]),
                row(&["short", "ONLINE"]),
            ],
        );
        let page = PageContent {
            text: String::new(),
            tables: vec![table],
        };
        let out = extractor().extract(&page);
        let names: Vec<&str> = out.snapshot.workers.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["rig-1", "rig-3"]);
        assert_eq!(out.coverage.worker_rows_rejected, 3);
        let Some(rig3) = out.snapshot.workers.get(1) else {
            panic!("rig-3 missing");
        };
        assert_eq!(rig3.last_exchange_time, None);
        assert_eq!(rig3.status, WorkerStatus::Offline);
    }

    #[test]
    fn earnings_require_a_date_cell() {
        let table = PageTable::from_rows(
            "Дата Общий доход Хешрейт",
            vec![
                row(&["12/3/2025", "0.0012 BTC", "110 TH/s"]),
                row(&["Итого", "0.5 BTC", ""]),
                row(&["1/1/2025", "0.0011 BTC"]),
            ],
        );
        let page = PageContent {
            text: String::new(),
            tables: vec![table],
        };
        let out = extractor().extract(&page);
        assert_eq!(out.snapshot.earnings.len(), 1);
        assert_eq!(out.coverage.earning_rows_rejected, 2);
        let Some(e) = out.snapshot.earnings.first() else {
            panic!("missing earning");
        };
        assert_eq!(e.date, "12/3/2025");
        assert_eq!(e.total_income, "0.0012 BTC");
    }

    #[test]
    fn unknown_wording_reports_zero_coverage() {
        let page = PageContent {
            text: "Hashrate actuel\n1 PH/s".to_string(),
            tables: vec![PageTable::from_rows("Mineurs", vec![row(&["a", "b", "c"])])],
        };
        let out = extractor().extract(&page);
        assert!(out.snapshot.summary.is_empty());
        assert!(out.coverage.matched_nothing());
        assert_eq!(out.coverage.tables_seen, 1);
    }
}
