//! Filtering downloader: the probe-filter-fetch pipeline over search results.
//!
//! The [`Downloader`] pulls candidate links from a [`Paginator`], runs each
//! one through the filter chain and, on acceptance, fetches the document and
//! records it in the [`Manifest`]. Links are handled strictly one at a time.
//!
//! # Per-link states
//!
//! ```text
//! candidate -> domain ok -> probe ok -> type ok -> age ok -> size ok -> Saved
//!        \            \           \          \         \          \
//!   InvalidDomain  FetchError    NotPdf    TooOld   TooLarge   FetchError
//! ```
//!
//! Remote failures (network, timeout, HTTP status) become
//! [`DownloadOutcome::SkippedFetchError`]. Local failures (output directory,
//! file write, manifest append) abort the run with an [`EngineError`].
//!
//! # Example
//!
//! ```no_run
//! use pdf_crawler_core::download::{Downloader, FilterPolicy, HttpClient};
//! use pdf_crawler_core::manifest::Manifest;
//! use pdf_crawler_core::search::{CustomSearchClient, Paginator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = CustomSearchClient::new("api-key", "engine-id")?;
//! let mut paginator = Paginator::new(Box::new(backend), "bericht filetype:pdf");
//! let manifest = Manifest::open("crawled_pdfs.csv").await?;
//! let downloader = Downloader::new(HttpClient::new()?, FilterPolicy::default(), manifest, "out");
//! let stats = downloader.run(&mut paginator, 10, |report| println!("{}", report.message())).await?;
//! println!("saved {} skipped {}", stats.saved(), stats.skipped());
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, instrument};

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::stored_filename;
use super::filter::{FilterPolicy, Rejection};
use crate::manifest::{Manifest, ManifestEntry, ManifestError};
use crate::search::Paginator;

/// Default directory documents are stored in.
pub const DEFAULT_OUTPUT_DIR: &str = "out";

/// Error type for fatal download engine failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// Directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A document could not be written locally.
    #[error(transparent)]
    Storage(#[from] DownloadError),

    /// The manifest could not be appended to.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Classification of one processed candidate link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadOutcome {
    /// Document fetched, stored, and recorded in the manifest.
    Saved,
    /// Host not in the allow-list.
    SkippedInvalidDomain,
    /// Probe did not report `application/pdf`.
    SkippedNotPdf,
    /// Last-modified earlier than the cutoff.
    SkippedTooOld,
    /// Content length above the maximum.
    SkippedTooLarge,
    /// Probe or fetch failed on the network or with an HTTP error status.
    SkippedFetchError,
}

impl DownloadOutcome {
    /// Whether the link was skipped.
    #[must_use]
    pub fn is_skipped(self) -> bool {
        self != Self::Saved
    }

    /// Stable snake-case label for logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::SkippedInvalidDomain => "skipped_invalid_domain",
            Self::SkippedNotPdf => "skipped_not_pdf",
            Self::SkippedTooOld => "skipped_too_old",
            Self::SkippedTooLarge => "skipped_too_large",
            Self::SkippedFetchError => "skipped_fetch_error",
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Rejection> for DownloadOutcome {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::InvalidDomain => Self::SkippedInvalidDomain,
            Rejection::NotPdf => Self::SkippedNotPdf,
            Rejection::TooOld => Self::SkippedTooOld,
            Rejection::TooLarge => Self::SkippedTooLarge,
        }
    }
}

/// Result of processing one candidate link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    /// Candidate URL as returned by the search stage.
    pub url: String,
    /// What happened to it.
    pub outcome: DownloadOutcome,
    /// Where it was stored, for [`DownloadOutcome::Saved`].
    pub stored_path: Option<PathBuf>,
    /// Bytes written, for [`DownloadOutcome::Saved`].
    pub bytes: u64,
}

impl LinkReport {
    fn skipped(url: &str, outcome: DownloadOutcome) -> Self {
        Self {
            url: url.to_string(),
            outcome,
            stored_path: None,
            bytes: 0,
        }
    }

    fn saved(url: &str, stored_path: PathBuf, bytes: u64) -> Self {
        Self {
            url: url.to_string(),
            outcome: DownloadOutcome::Saved,
            stored_path: Some(stored_path),
            bytes,
        }
    }

    /// One-line human-readable progress message.
    #[must_use]
    pub fn message(&self) -> String {
        match self.outcome {
            DownloadOutcome::Saved => {
                let path = self
                    .stored_path
                    .as_deref()
                    .map_or_else(|| self.url.clone(), |p| p.display().to_string());
                format!("{path} downloaded")
            }
            DownloadOutcome::SkippedInvalidDomain => {
                format!("{} is not from an allowed domain. Skipping.", self.url)
            }
            DownloadOutcome::SkippedNotPdf => format!("{} is not a valid PDF. Skipping.", self.url),
            DownloadOutcome::SkippedTooOld => {
                format!("{} is older than the cutoff date. Skipping.", self.url)
            }
            DownloadOutcome::SkippedTooLarge => format!("{} is too large. Skipping.", self.url),
            DownloadOutcome::SkippedFetchError => {
                format!("Error fetching {}. Skipping.", self.url)
            }
        }
    }
}

/// Counters for one download run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadStats {
    saved: usize,
    invalid_domain: usize,
    not_pdf: usize,
    too_old: usize,
    too_large: usize,
    fetch_error: usize,
    requeries: usize,
    unprocessed: usize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved documents.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.saved
    }

    /// Number of skipped links, across all skip reasons.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.invalid_domain + self.not_pdf + self.too_old + self.too_large + self.fetch_error
    }

    /// Number of processed links (saved + skipped).
    #[must_use]
    pub fn total(&self) -> usize {
        self.saved + self.skipped()
    }

    /// Number of links with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: DownloadOutcome) -> usize {
        match outcome {
            DownloadOutcome::Saved => self.saved,
            DownloadOutcome::SkippedInvalidDomain => self.invalid_domain,
            DownloadOutcome::SkippedNotPdf => self.not_pdf,
            DownloadOutcome::SkippedTooOld => self.too_old,
            DownloadOutcome::SkippedTooLarge => self.too_large,
            DownloadOutcome::SkippedFetchError => self.fetch_error,
        }
    }

    /// Number of times the paginator was asked for more candidates after
    /// the initial batch ran out.
    #[must_use]
    pub fn requeries(&self) -> usize {
        self.requeries
    }

    /// Candidates fetched from the search stage but never processed because
    /// the target was reached first.
    #[must_use]
    pub fn unprocessed(&self) -> usize {
        self.unprocessed
    }

    fn record(&mut self, outcome: DownloadOutcome) {
        let counter = match outcome {
            DownloadOutcome::Saved => &mut self.saved,
            DownloadOutcome::SkippedInvalidDomain => &mut self.invalid_domain,
            DownloadOutcome::SkippedNotPdf => &mut self.not_pdf,
            DownloadOutcome::SkippedTooOld => &mut self.too_old,
            DownloadOutcome::SkippedTooLarge => &mut self.too_large,
            DownloadOutcome::SkippedFetchError => &mut self.fetch_error,
        };
        *counter += 1;
    }
}

/// Sequential probe-filter-fetch pipeline.
#[derive(Debug)]
pub struct Downloader {
    client: HttpClient,
    policy: FilterPolicy,
    manifest: Manifest,
    output_dir: PathBuf,
    date_prefix: bool,
}

impl Downloader {
    /// Creates a downloader storing documents under `output_dir`, with
    /// last-modified date prefixes enabled.
    #[must_use]
    pub fn new(
        client: HttpClient,
        policy: FilterPolicy,
        manifest: Manifest,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            policy,
            manifest,
            output_dir: output_dir.into(),
            date_prefix: true,
        }
    }

    /// Enables or disables the `YYYYMMDD_` filename prefix.
    #[must_use]
    pub fn with_date_prefix(mut self, date_prefix: bool) -> Self {
        self.date_prefix = date_prefix;
        self
    }

    /// Processes candidates until `target` documents are saved or the
    /// paginator runs dry.
    ///
    /// The initial batch asks the paginator for `target` results; whenever the
    /// batch is used up it asks for the number of documents still missing.
    /// `on_link` is called once per processed link, in processing order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the output directory cannot be created or a
    /// document or manifest row cannot be written locally. Remote failures
    /// never abort the run.
    #[instrument(skip(self, paginator, on_link), fields(query = %paginator.query()))]
    pub async fn run<F>(
        &self,
        paginator: &mut Paginator,
        target: usize,
        mut on_link: F,
    ) -> Result<DownloadStats, EngineError>
    where
        F: FnMut(&LinkReport),
    {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| EngineError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let mut stats = DownloadStats::new();
        let mut batch: VecDeque<_> = paginator.next_batch(target).await.into();

        while stats.saved() < target {
            let Some(candidate) = batch.pop_front() else {
                let missing = target - stats.saved();
                debug!(missing, "candidate batch exhausted; re-querying");
                let refill = paginator.next_batch(missing).await;
                if refill.is_empty() {
                    info!(
                        saved = stats.saved(),
                        target, "no further search results; stopping early"
                    );
                    break;
                }
                stats.requeries += 1;
                batch.extend(refill);
                continue;
            };

            let report = self.process_link(&candidate.url).await?;
            stats.record(report.outcome);
            on_link(&report);
        }

        stats.unprocessed = batch.len();
        info!(
            saved = stats.saved(),
            skipped = stats.skipped(),
            requeries = stats.requeries(),
            unprocessed = stats.unprocessed(),
            "download run complete"
        );
        Ok(stats)
    }

    /// Runs one candidate through the filter chain and, if accepted, fetches
    /// and records it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for local storage failures.
    #[instrument(skip(self))]
    pub async fn process_link(&self, candidate: &str) -> Result<LinkReport, EngineError> {
        let url = match self.policy.check_domain(candidate) {
            Ok(url) => url,
            Err(rejection) => return Ok(skip(candidate, rejection.into())),
        };

        let probe = match self.client.probe(&url).await {
            Ok(probe) => probe,
            Err(error) if error.is_remote() => {
                debug!(error = %error, "metadata probe failed");
                return Ok(skip(candidate, DownloadOutcome::SkippedFetchError));
            }
            Err(error) => return Err(error.into()),
        };

        if let Err(rejection) = self.policy.check_metadata(&probe) {
            return Ok(skip(candidate, rejection.into()));
        }

        let filename = stored_filename(&url, probe.last_modified, self.date_prefix);
        let dest = self.output_dir.join(filename);

        let partial = match self.client.fetch_partial(&url, &dest).await {
            Ok(partial) => partial,
            Err(error) if error.is_remote() => {
                debug!(error = %error, "fetch failed");
                return Ok(skip(candidate, DownloadOutcome::SkippedFetchError));
            }
            Err(error) => return Err(error.into()),
        };
        let bytes = partial.bytes();

        let entry = ManifestEntry::new(candidate, &dest);
        if let Err(error) = self.manifest.append(&entry).await {
            partial.discard().await;
            return Err(error.into());
        }
        let dest = partial.commit().await?;

        info!(outcome = "saved", path = %dest.display(), bytes, "document saved");
        Ok(LinkReport::saved(candidate, dest, bytes))
    }
}

fn skip(candidate: &str, outcome: DownloadOutcome) -> LinkReport {
    info!(outcome = outcome.label(), "link skipped");
    LinkReport::skipped(candidate, outcome)
}
