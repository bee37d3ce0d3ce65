//! Append-only CSV ledger of saved documents.
//!
//! The manifest maps each downloaded URL to the path it was stored at. It is
//! created with a fixed header row when absent (or empty) and afterwards only
//! ever appended to; rows from earlier runs are never rewritten.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Default manifest file name.
pub const DEFAULT_MANIFEST_FILE: &str = "crawled_pdfs.csv";

/// Header row written to a fresh manifest.
pub const MANIFEST_HEADER: [&str; 2] = ["URL", "Filename"];

const LINE_TERMINATOR: &str = "\r\n";

/// Errors raised while creating or appending to the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File system error on the manifest file.
    #[error("IO error on manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Source URL of the saved document.
    pub url: String,
    /// Path the document was written to.
    pub stored_path: String,
}

impl ManifestEntry {
    /// Creates an entry from a URL and the path it was stored at.
    #[must_use]
    pub fn new(url: impl Into<String>, stored_path: &Path) -> Self {
        Self {
            url: url.into(),
            stored_path: stored_path.display().to_string(),
        }
    }

    fn to_csv_row(&self) -> String {
        csv_row(&[&self.url, &self.stored_path])
    }
}

/// Handle to the manifest file.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    /// Opens the manifest at `path`, writing the header row if the file is
    /// missing or empty. Parent directories are not created.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be created or written.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| ManifestError::io(&path, e))?;

        let len = file
            .metadata()
            .await
            .map_err(|e| ManifestError::io(&path, e))?
            .len();
        if len == 0 {
            debug!("writing manifest header");
            file.write_all(csv_row(&MANIFEST_HEADER).as_bytes())
                .await
                .map_err(|e| ManifestError::io(&path, e))?;
            file.flush().await.map_err(|e| ManifestError::io(&path, e))?;
        }

        Ok(Self { path })
    }

    /// Path of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row. The row is written with a single append so an
    /// interrupted run never leaves half a row behind a complete one.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be opened or written.
    pub async fn append(&self, entry: &ManifestEntry) -> Result<(), ManifestError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ManifestError::io(&self.path, e))?;
        file.write_all(entry.to_csv_row().as_bytes())
            .await
            .map_err(|e| ManifestError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| ManifestError::io(&self.path, e))?;
        debug!(url = %entry.url, stored_path = %entry.stored_path, "manifest row appended");
        Ok(())
    }
}

/// Formats one CSV record (RFC 4180 minimal quoting, CRLF terminated).
fn csv_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str(LINE_TERMINATOR);
    row
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
