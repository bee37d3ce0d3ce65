//! HTTP client wrapper for probing and fetching candidate documents.
//!
//! This module provides the `HttpClient` struct which issues the metadata
//! probe (HEAD) and the streaming full fetch (GET) with explicit timeouts.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, LAST_MODIFIED};
use reqwest::{Client, ClientBuilder};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, PARTIAL_SUFFIX, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Headers reported by a metadata probe.
///
/// Every field is optional; a missing or malformed header is recorded as
/// `None` rather than failing the probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeMetadata {
    /// Raw `Content-Type` header value.
    pub content_type: Option<String>,
    /// Parsed `Content-Length` header value.
    pub content_length: Option<u64>,
    /// Parsed `Last-Modified` header value.
    pub last_modified: Option<DateTime<Utc>>,
}

impl ProbeMetadata {
    /// Extracts probe metadata from response headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_str = move |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());

        let last_modified = header_str(LAST_MODIFIED).and_then(|raw| {
            let parsed = parse_last_modified(raw);
            if parsed.is_none() {
                debug!(value = raw, "unparseable Last-Modified header");
            }
            parsed
        });

        Self {
            content_type: header_str(CONTENT_TYPE).map(str::to_string),
            content_length: header_str(CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
            last_modified,
        }
    }
}

/// Parses an RFC 7231 HTTP-date into a UTC timestamp.
#[must_use]
pub fn parse_last_modified(value: &str) -> Option<DateTime<Utc>> {
    httpdate::parse_http_date(value.trim())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// HTTP client for the probe-then-fetch pipeline.
///
/// Created once per run and reused for every candidate so connections are
/// pooled.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with default timeouts (30s connect, 5min total).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, DownloadError> {
        let client = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .build()
            .map_err(DownloadError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Issues a HEAD request and returns the reported metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure, timeout, or a non-success
    /// HTTP status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn probe(&self, url: &Url) -> Result<ProbeMetadata, DownloadError> {
        let response = self.send(self.client.head(url.clone()), url).await?;
        let metadata = ProbeMetadata::from_headers(response.headers());
        debug!(?metadata, "probe complete");
        Ok(metadata)
    }

    /// Issues a GET request and streams the body next to `dest`.
    ///
    /// The body lands in a sibling `*.part` file; `dest` itself is untouched
    /// until [`PartialDownload::commit`] renames it into place. A failed fetch
    /// never leaves a partial file behind.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on network failure, timeout, non-success
    /// HTTP status, or a local write failure.
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    pub async fn fetch_partial(
        &self,
        url: &Url,
        dest: &Path,
    ) -> Result<PartialDownload, DownloadError> {
        let response = self.send(self.client.get(url.clone()), url).await?;

        let part_path = partial_path(dest);
        let mut file = File::create(&part_path)
            .await
            .map_err(|e| DownloadError::io(part_path.clone(), e))?;

        let streamed = stream_to_file(&mut file, response, url.as_str(), &part_path).await;
        drop(file);

        match streamed {
            Ok(bytes) => {
                debug!(bytes, "fetch complete");
                Ok(PartialDownload {
                    part_path,
                    dest: dest.to_path_buf(),
                    bytes,
                })
            }
            Err(error) => {
                debug!(path = %part_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&part_path).await;
                Err(error)
            }
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<reqwest::Response, DownloadError> {
        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }
}

/// A fully fetched body waiting in its `*.part` file.
#[derive(Debug)]
#[must_use = "a partial download is left on disk unless committed or discarded"]
pub struct PartialDownload {
    part_path: PathBuf,
    dest: PathBuf,
    bytes: u64,
}

impl PartialDownload {
    /// Bytes written.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Renames the body onto its destination, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] if the rename fails; the `*.part` file is
    /// removed in that case.
    pub async fn commit(self) -> Result<PathBuf, DownloadError> {
        if let Err(error) = tokio::fs::rename(&self.part_path, &self.dest).await {
            let _ = tokio::fs::remove_file(&self.part_path).await;
            return Err(DownloadError::io(self.dest, error));
        }
        Ok(self.dest)
    }

    /// Deletes the body without touching the destination.
    pub async fn discard(self) {
        debug!(path = %self.part_path.display(), "discarding partial download");
        let _ = tokio::fs::remove_file(&self.part_path).await;
    }
}

fn base_client_builder(connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .user_agent(user_agent::default_download_user_agent())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map_or_else(|| OsString::from("download"), ToOwned::to_owned);
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
