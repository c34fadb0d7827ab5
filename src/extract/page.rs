//! Rendered page content as the extractor consumes it.

use serde::{Deserialize, Serialize};

/// One DOM table: header text plus the cell text of every body row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTable {
    /// Visible text of the table header (`thead`).
    pub header_text: String,
    /// Visible text of the table body.
    pub body_text: String,
    /// Body rows, each a list of trimmed cell texts.
    pub rows: Vec<Vec<String>>,
}

impl PageTable {
    /// Builds a table from header text and body rows; body text is derived
    /// from the cells.
    #[must_use]
    pub fn from_rows(header_text: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        let body_text = rows
            .iter()
            .map(|cells| cells.join("\t"))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            header_text: header_text.into(),
            body_text,
            rows,
        }
    }
}

/// Visible text and tables of a loaded observer page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    /// Full visible text, one rendered line per line.
    pub text: String,
    /// Tables in document order.
    pub tables: Vec<PageTable>,
}
