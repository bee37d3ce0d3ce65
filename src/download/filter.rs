//! Ordered accept/reject predicates applied to each candidate link.
//!
//! The chain runs in a fixed order: domain (before any network traffic), then
//! on the probe's metadata content type, age, and size. The first failing
//! predicate decides the [`Rejection`]; later ones are not evaluated.

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

use super::client::ProbeMetadata;
use super::constants::PDF_CONTENT_TYPE;

/// Default domain allow-list when none is configured.
pub const DEFAULT_ALLOWED_TLDS: &[&str] = &[".de"];

/// Why a candidate was rejected by the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Host does not match any allow-listed suffix (or URL has no host).
    InvalidDomain,
    /// Probe reported a content type other than `application/pdf`.
    NotPdf,
    /// Probe reported a last-modified date earlier than the cutoff.
    TooOld,
    /// Probe reported a content length above the configured maximum.
    TooLarge,
}

/// Filter settings for one crawl run.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    allowed_tlds: Vec<String>,
    cutoff: Option<DateTime<Utc>>,
    max_size: Option<u64>,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_TLDS.iter().copied(), None, None)
    }
}

impl FilterPolicy {
    /// Creates a policy. Allow-list entries are trimmed and lowercased.
    #[must_use]
    pub fn new<I, S>(allowed_tlds: I, cutoff: Option<DateTime<Utc>>, max_size: Option<u64>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_tlds = allowed_tlds
            .into_iter()
            .map(|tld| tld.as_ref().trim().to_ascii_lowercase())
            .filter(|tld| !tld.trim_start_matches('.').is_empty())
            .collect();
        Self {
            allowed_tlds,
            cutoff,
            max_size,
        }
    }

    /// Configured allow-list (normalized).
    #[must_use]
    pub fn allowed_tlds(&self) -> &[String] {
        &self.allowed_tlds
    }

    /// Parses the candidate URL and checks its host against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::InvalidDomain`] for unparseable URLs, URLs without
    /// a host, and hosts outside the allow-list.
    pub fn check_domain(&self, candidate: &str) -> Result<Url, Rejection> {
        let url = Url::parse(candidate).map_err(|_| Rejection::InvalidDomain)?;
        let host = url.host_str().ok_or(Rejection::InvalidDomain)?;
        if self
            .allowed_tlds
            .iter()
            .any(|suffix| host_matches_suffix(host, suffix))
        {
            Ok(url)
        } else {
            Err(Rejection::InvalidDomain)
        }
    }

    /// Applies the content-type, age, and size predicates in that order.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] of the first failing predicate.
    pub fn check_metadata(&self, probe: &ProbeMetadata) -> Result<(), Rejection> {
        if probe.content_type.as_deref() != Some(PDF_CONTENT_TYPE) {
            return Err(Rejection::NotPdf);
        }

        if let Some(cutoff) = self.cutoff {
            match probe.last_modified {
                Some(modified) if modified < cutoff => return Err(Rejection::TooOld),
                Some(_) => {}
                None => debug!("no usable Last-Modified; age filter passes"),
            }
        }

        if let Some(max_size) = self.max_size
            && probe.content_length.unwrap_or(0) > max_size
        {
            return Err(Rejection::TooLarge);
        }

        Ok(())
    }
}

/// Label-boundary suffix match: `.de` and `de` both accept `uni.de` and `de`,
/// neither accepts `made`.
fn host_matches_suffix(host: &str, suffix: &str) -> bool {
    let bare = suffix.trim_start_matches('.');
    let host = host.trim_end_matches('.');
    host == bare
        || host
            .strip_suffix(bare)
            .is_some_and(|rest| rest.ends_with('.'))
}
