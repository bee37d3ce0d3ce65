//! Error types for search API calls.

use thiserror::Error;

/// Errors that can occur while fetching a page of search results.
///
/// A search error ends pagination for the current call; it never aborts the
/// crawl as a whole.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network-level failure reaching the search API.
    #[error("search request failed (start={start}): {source}")]
    Request {
        /// 1-indexed start offset of the failed page.
        start: u32,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The search API answered with a non-success status.
    #[error("search API returned HTTP {status} (start={start}): {message}")]
    HttpStatus {
        /// 1-indexed start offset of the failed page.
        start: u32,
        /// The HTTP status code.
        status: u16,
        /// Error message reported by the API, if any.
        message: String,
    },

    /// The response body was not a valid search page.
    #[error("malformed search response (start={start}): {source}")]
    Decode {
        /// 1-indexed start offset of the failed page.
        start: u32,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured endpoint is not a valid URL.
    #[error("invalid search endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The search HTTP client could not be constructed.
    #[error("failed to build search HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl SearchError {
    /// Creates a request error with the URL stripped, since page URLs carry
    /// the API key.
    #[must_use]
    pub fn request(start: u32, source: reqwest::Error) -> Self {
        Self::Request {
            start,
            source: source.without_url(),
        }
    }
}
