//! Page suppliers.
//!
//! The extractor never loads pages itself; a [`PageSource`] hands it the
//! visible text and tables of an observer page once the page is loaded.
//! Load failures are hard failures for the pool's cycle.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::html::page_from_html;
use super::page::PageContent;

/// Why a page could not be supplied.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The load did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// No page is known for the URL.
    #[error("no page for {0}")]
    NotFound(String),
}

/// Supplies the loaded content of an observer page.
#[async_trait]
pub trait PageSource: Send + Sync + std::fmt::Debug {
    /// Loads `url` and returns its visible text and tables.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the page cannot be loaded.
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}

/// Fetches server-rendered HTML over HTTP.
///
/// Suitable for dashboards that render their data server-side. Pages that
/// build their tables in the browser need a rendering supplier instead.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPageSource {
    /// Creates a source whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mining-pool-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else if let Some(status) = e.status() {
                FetchError::Status(status.as_u16())
            } else {
                FetchError::Transport(e.to_string())
            }
        };
        let html = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(map_err)?
            .text()
            .await
            .map_err(map_err)?;
        tracing::debug!(url, bytes = html.len(), "observer page loaded");
        Ok(page_from_html(&html))
    }
}

/// Serves pre-loaded content keyed by URL.
///
/// Used for replaying captured pages and in tests; content can be swapped
/// between cycles with [`StaticPageSource::set_page`].
#[derive(Debug, Default)]
pub struct StaticPageSource {
    pages: RwLock<HashMap<String, PageContent>>,
}

impl StaticPageSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) the content served for `url`.
    pub async fn set_page(&self, url: impl Into<String>, page: PageContent) {
        self.pages.write().await.insert(url.into(), page);
    }
}

#[async_trait]
impl PageSource for StaticPageSource {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        self.pages
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
