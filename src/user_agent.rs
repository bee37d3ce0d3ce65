//! Shared User-Agent strings for the search and download HTTP clients.
//!
//! Single source for project URL and UA format so search and download traffic
//! stay consistent and easy to update.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/pdf-crawler";

/// Default User-Agent for probe and fetch requests against document hosts.
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pdf-crawler/{version} (document-collection-tool; +{PROJECT_UA_URL})")
}

/// Default User-Agent for search API requests.
#[must_use]
pub(crate) fn default_search_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pdf-crawler/{version} (search-client; +{PROJECT_UA_URL})")
}
