//! Extraction layer: page content in, structured records out.
//!
//! A [`PageSource`] loads the observer page, the [`Extractor`] matches its
//! text and tables against a [`Vocabulary`] and produces a
//! [`crate::domain::ScrapedSnapshot`] together with an
//! [`ExtractionCoverage`] report.

pub mod extractor;
pub mod html;
pub mod page;
pub mod source;
pub mod vocabulary;

pub use extractor::{Extraction, ExtractionCoverage, Extractor};
pub use page::{PageContent, PageTable};
pub use source::{FetchError, HttpPageSource, PageSource, StaticPageSource};
pub use vocabulary::{PageMatcher, TableKind, Vocabulary};
