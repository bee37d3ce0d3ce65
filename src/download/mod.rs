//! Probe, filter, and fetch candidate documents.
//!
//! # Features
//!
//! - HEAD metadata probe before paying for a full download
//! - Ordered filter chain: domain allow-list, content type, age, size
//! - Streaming GET into a `*.part` file, renamed into place once recorded
//! - Deterministic filenames from the URL, optionally date-prefixed
//! - Explicit timeouts (30s connect, 5min total by default)
//!
//! # Example
//!
//! ```no_run
//! use pdf_crawler_core::download::{FilterPolicy, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = FilterPolicy::default();
//! let url = policy.check_domain("https://www.uni-hamburg.de/bericht.pdf").map_err(|r| format!("{r:?}"))?;
//! let client = HttpClient::new()?;
//! let probe = client.probe(&url).await?;
//! println!("{:?}", probe.content_type);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod filename;
mod filter;

pub use client::{HttpClient, PartialDownload, ProbeMetadata, parse_last_modified};
pub use constants::{CONNECT_TIMEOUT_SECS, PDF_CONTENT_TYPE, READ_TIMEOUT_SECS};
pub use engine::{
    DEFAULT_OUTPUT_DIR, DownloadOutcome, DownloadStats, Downloader, EngineError, LinkReport,
};
pub use error::DownloadError;
pub use filename::stored_filename;
pub use filter::{DEFAULT_ALLOWED_TLDS, FilterPolicy, Rejection};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
