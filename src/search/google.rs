//! Google Custom Search JSON API backend.
//!
//! The [`CustomSearchClient`] calls `customsearch/v1` with the API key and the
//! search-engine identifier (`cx`) that restricts which sites are searched.
//! Each item's `link` becomes a [`SearchResult`]; a page without `items`
//! marks the end of results.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{SearchBackend, SearchError, SearchResult};
use crate::user_agent;

/// Default Custom Search API endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

// ==================== API Response Types ====================

/// One page of results.
#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// Error envelope returned alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

// ==================== CustomSearchClient ====================

/// Search backend for the Google Custom Search JSON API.
pub struct CustomSearchClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    engine_id: String,
}

impl CustomSearchClient {
    /// Creates a client against the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if HTTP client construction fails.
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Result<Self, SearchError> {
        Self::with_endpoint(api_key, engine_id, DEFAULT_SEARCH_ENDPOINT)
    }

    /// Creates a client against a custom endpoint (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the endpoint is not an absolute http(s) URL
    /// or HTTP client construction fails.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        endpoint: &str,
    ) -> Result<Self, SearchError> {
        Self::with_endpoint_and_timeouts(
            api_key,
            engine_id,
            endpoint,
            CONNECT_TIMEOUT_SECS,
            READ_TIMEOUT_SECS,
        )
    }

    /// Creates a client with a custom endpoint and explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the endpoint is not an absolute http(s) URL
    /// or HTTP client construction fails.
    pub fn with_endpoint_and_timeouts(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        endpoint: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, SearchError> {
        let endpoint_url = Url::parse(endpoint).map_err(|e| SearchError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(endpoint_url.scheme(), "http" | "https") {
            return Err(SearchError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_search_user_agent())
            .gzip(true)
            .build()
            .map_err(SearchError::ClientBuild)?;

        Ok(Self {
            client,
            endpoint: endpoint_url,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        })
    }

    fn page_url(&self, query: &str, start: u32, page_size: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("cx", &self.engine_id)
            .append_pair("q", query)
            .append_pair("num", &page_size.to_string())
            .append_pair("start", &start.to_string());
        url
    }
}

impl std::fmt::Debug for CustomSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomSearchClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("engine_id", &self.engine_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchBackend for CustomSearchClient {
    fn name(&self) -> &'static str {
        "google-cse"
    }

    #[tracing::instrument(skip(self, query), fields(backend = "google-cse"))]
    async fn fetch_page(
        &self,
        query: &str,
        start: u32,
        page_size: u32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.page_url(query, start, page_size);
        debug!(endpoint = %self.endpoint, "calling search API");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SearchError::request(start, source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| SearchError::request(start, source))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(SearchError::HttpStatus {
                start,
                status: status.as_u16(),
                message,
            });
        }

        let page: SearchPage =
            serde_json::from_str(&body).map_err(|source| SearchError::Decode { start, source })?;

        Ok(page
            .items
            .into_iter()
            .filter_map(|item| {
                let Some(link) = item
                    .get("link")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
                else {
                    warn!(start, "search item without link; ignoring");
                    return None;
                };
                Some(SearchResult {
                    url: link,
                    raw_metadata: item,
                })
            })
            .collect())
    }
}
