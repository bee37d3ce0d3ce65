//! Paged web search producing candidate document links.
//!
//! # Architecture
//!
//! - [`SearchBackend`] - Async trait for one page of results from a search API
//! - [`CustomSearchClient`] - Google Custom Search JSON API backend
//! - [`Paginator`] - Stateful "search until goal is met" loop over a backend
//! - [`build_search_query`] - Turns comma-separated terms into a PDF-only query
//!
//! # Example
//!
//! ```no_run
//! use pdf_crawler_core::search::{CustomSearchClient, Paginator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = CustomSearchClient::new("api-key", "engine-id")?;
//! let mut paginator = Paginator::new(Box::new(backend), "bericht filetype:pdf");
//! let results = paginator.next_batch(25).await;
//! for result in &results {
//!     println!("{}", result.url);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod google;
mod paginator;
mod query;

pub use error::SearchError;
pub use google::{CustomSearchClient, DEFAULT_SEARCH_ENDPOINT};
pub use paginator::{PAGE_SIZE, Paginator};
pub use query::{PDF_FILETYPE_SUFFIX, build_search_query};

use async_trait::async_trait;

/// One entry returned by the search API.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The result's link; the only field consumed downstream.
    pub url: String,
    /// The untouched API record.
    pub raw_metadata: serde_json::Value,
}

impl SearchResult {
    /// Creates a result with no extra metadata.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_metadata: serde_json::Value::Null,
        }
    }
}

/// A paged text-search API.
///
/// Implementations return one page of results for a 1-indexed `start` offset.
/// An empty page signals that the API has no further results.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Fetches up to `page_size` results starting at the 1-indexed `start`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the page cannot be fetched or decoded.
    async fn fetch_page(
        &self,
        query: &str,
        start: u32,
        page_size: u32,
    ) -> Result<Vec<SearchResult>, SearchError>;
}
