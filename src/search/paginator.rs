//! "Search until goal is met" pagination over a [`SearchBackend`].

use tracing::{debug, info, warn};

use super::{SearchBackend, SearchResult};

/// Results requested per page.
pub const PAGE_SIZE: u32 = 10;

/// Stateful pager over one query.
///
/// The paginator remembers where it stopped, so each call to
/// [`next_batch`](Self::next_batch) continues with the following page. Once a
/// page comes back empty or a request fails, the paginator is exhausted and
/// never contacts the backend again.
pub struct Paginator {
    backend: Box<dyn SearchBackend>,
    query: String,
    next_start: u32,
    exhausted: bool,
    pages_fetched: usize,
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("backend", &self.backend.name())
            .field("query", &self.query)
            .field("next_start", &self.next_start)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl Paginator {
    /// Creates a paginator starting at the first result.
    #[must_use]
    pub fn new(backend: Box<dyn SearchBackend>, query: impl Into<String>) -> Self {
        Self {
            backend,
            query: query.into(),
            next_start: 1,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// The query being paged.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether the backend has reported the end of results (or failed).
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of pages fetched successfully so far.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches pages until at least `goal` results are collected, a page is
    /// empty, or a request fails.
    ///
    /// Pages are taken whole, so the batch can exceed `goal`. On failure or
    /// exhaustion the results gathered so far are returned, possibly none.
    /// Results keep the API's ranking order.
    pub async fn next_batch(&mut self, goal: usize) -> Vec<SearchResult> {
        let mut collected = Vec::new();

        while collected.len() < goal && !self.exhausted {
            let start = self.next_start;
            debug!(
                backend = self.backend.name(),
                start,
                page_size = PAGE_SIZE,
                "fetching search page"
            );

            match self
                .backend
                .fetch_page(&self.query, start, PAGE_SIZE)
                .await
            {
                Ok(page) if page.is_empty() => {
                    info!(start, "search results exhausted");
                    self.exhausted = true;
                }
                Ok(page) => {
                    self.pages_fetched += 1;
                    self.next_start = start.saturating_add(PAGE_SIZE);
                    collected.extend(page);
                }
                Err(error) => {
                    warn!(error = %error, start, "error fetching search results");
                    self.exhausted = true;
                }
            }
        }

        debug!(
            collected = collected.len(),
            goal,
            exhausted = self.exhausted,
            "search batch complete"
        );
        collected
    }
}
