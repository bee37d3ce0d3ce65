//! Validated crawl configuration.
//!
//! [`CrawlConfig`] is assembled by the CLI and checked with
//! [`CrawlConfig::validate`] before any network activity starts; every
//! [`ConfigError`] is fatal.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::download::{
    CONNECT_TIMEOUT_SECS, DEFAULT_ALLOWED_TLDS, DEFAULT_OUTPUT_DIR, READ_TIMEOUT_SECS,
};
use crate::manifest::DEFAULT_MANIFEST_FILE;
use crate::search::{DEFAULT_SEARCH_ENDPOINT, build_search_query};

/// Default number of documents to collect.
pub const DEFAULT_TARGET_COUNT: usize = 100;

/// Accepted `--cutoff-date` format.
pub const CUTOFF_DATE_FORMAT: &str = "%Y-%m-%d";

/// Configuration errors, reported before any request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No search query, or only blank terms.
    #[error("a search query is required (--query)")]
    MissingQuery,

    /// No API key.
    #[error("an API key is required (--key or PDF_CRAWLER_API_KEY)")]
    MissingApiKey,

    /// No search-engine identifier.
    #[error("a search engine ID is required (--cse or PDF_CRAWLER_CSE_ID)")]
    MissingEngineId,

    /// Cutoff date not in `YYYY-MM-DD` form.
    #[error("Invalid date format for cutoff date: {value:?}. Use YYYY-MM-DD.")]
    InvalidCutoffDate {
        /// The rejected input.
        value: String,
    },

    /// Target count of zero.
    #[error("the number of documents to collect must be at least 1")]
    InvalidTarget,

    /// Allow-list without any usable entry.
    #[error("at least one allowed domain suffix is required")]
    EmptyAllowList,

    /// Zero-second timeout.
    #[error("{name} must be at least 1 second")]
    InvalidTimeout {
        /// Which timeout.
        name: &'static str,
    },
}

/// Parses a `YYYY-MM-DD` cutoff date as midnight UTC.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCutoffDate`] for anything else.
pub fn parse_cutoff_date(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), CUTOFF_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
        .ok_or_else(|| ConfigError::InvalidCutoffDate {
            value: value.to_string(),
        })
}

/// Turns user query input into the query sent to the search API.
///
/// With `raw` set the input is sent verbatim (trimmed); otherwise it is split
/// on commas and expanded by [`build_search_query`].
///
/// # Errors
///
/// Returns [`ConfigError::MissingQuery`] when nothing searchable remains.
pub fn resolve_query(input: &str, raw: bool) -> Result<String, ConfigError> {
    if raw {
        let trimmed = input.trim();
        return if trimmed.is_empty() {
            Err(ConfigError::MissingQuery)
        } else {
            Ok(trimmed.to_string())
        };
    }
    build_search_query(input).ok_or(ConfigError::MissingQuery)
}

/// Everything one crawl run needs.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Search API key.
    pub api_key: String,
    /// Search-engine (site restriction) identifier.
    pub engine_id: String,
    /// Final query sent to the search API.
    pub query: String,
    /// Number of documents to save.
    pub target: usize,
    /// Maximum reported content length in bytes.
    pub max_size: Option<u64>,
    /// Minimum last-modified timestamp.
    pub cutoff: Option<DateTime<Utc>>,
    /// Accepted host suffixes.
    pub allowed_tlds: Vec<String>,
    /// Directory documents are stored in.
    pub output_dir: PathBuf,
    /// Manifest CSV path.
    pub manifest_path: PathBuf,
    /// Prefix stored filenames with the last-modified date.
    pub date_prefix: bool,
    /// Search API endpoint.
    pub search_endpoint: String,
    /// Connect timeout for document requests.
    pub connect_timeout_secs: u64,
    /// Total timeout for document requests.
    pub read_timeout_secs: u64,
}

impl CrawlConfig {
    /// Creates a configuration with default settings for everything but the
    /// credentials and query.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            query: query.into(),
            target: DEFAULT_TARGET_COUNT,
            max_size: None,
            cutoff: None,
            allowed_tlds: DEFAULT_ALLOWED_TLDS.iter().map(|s| (*s).to_string()).collect(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_FILE),
            date_prefix: true,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }

    /// Checks the configuration for fatal problems.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::MissingQuery);
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.engine_id.trim().is_empty() {
            return Err(ConfigError::MissingEngineId);
        }
        if self.target == 0 {
            return Err(ConfigError::InvalidTarget);
        }
        if !self
            .allowed_tlds
            .iter()
            .any(|tld| !tld.trim().trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::EmptyAllowList);
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "connect timeout",
            });
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                name: "read timeout",
            });
        }
        Ok(())
    }
}
