//! PDF Crawler Core Library
//!
//! Collects PDF documents from a web search: pages through search results
//! until enough candidates are gathered, probes and filters each candidate,
//! downloads the accepted ones, and records every saved document in an
//! append-only CSV manifest.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`search`] - Search backends and the stateful result paginator
//! - [`download`] - Metadata probe, filter chain, and streaming download engine
//! - [`manifest`] - Append-only `URL,Filename` ledger
//! - [`config`] - Validated run configuration
//! - [`crawl`] - Wiring for one complete run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod crawl;
pub mod download;
pub mod manifest;
pub mod search;
#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, CrawlConfig, parse_cutoff_date, resolve_query};
pub use crawl::{CrawlError, run_crawl, run_crawl_with_backend};
pub use download::{
    DownloadOutcome, DownloadStats, Downloader, EngineError, FilterPolicy, HttpClient, LinkReport,
};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
pub use search::{CustomSearchClient, Paginator, SearchBackend, SearchError, SearchResult};
