//! Filename derivation and sanitization for stored documents.
//!
//! Stored names are deterministic: the URL's final path segment, optionally
//! prefixed with the probe's last-modified date as `YYYYMMDD_`. Two URLs that
//! share a final segment map to the same file; the later download overwrites
//! the earlier one.

use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

/// Longest stored name in bytes, before the date prefix and `.part` suffix.
///
/// Leaves room for `YYYYMMDD_` and `.part` under the common 255-byte limit.
pub(crate) const MAX_FILENAME_BYTES: usize = 200;

/// Extensions longer than this are treated as part of the stem.
const MAX_EXTENSION_BYTES: usize = 16;

/// Builds the stored filename for a candidate URL.
///
/// `last_modified` is only used when `date_prefix` is set; a missing date
/// leaves the name unprefixed.
#[must_use]
pub fn stored_filename(
    url: &Url,
    last_modified: Option<DateTime<Utc>>,
    date_prefix: bool,
) -> String {
    let base = filename_from_url(url);
    match last_modified {
        Some(date) if date_prefix => format!("{}_{base}", date.format("%Y%m%d")),
        _ => base,
    }
}

/// Filename derived from the URL's final path segment.
///
/// The segment is percent-decoded and sanitized. URLs ending in `/` fall back
/// to the host name with dots replaced, plus `.pdf`.
pub(crate) fn filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(
                segment = %last,
                error = %e,
                "URL decoding failed, using raw segment"
            );
            last.into()
        });
        return sanitize_filename(&decoded);
    }

    let host = url
        .host_str()
        .map_or_else(|| "download".to_string(), |h| h.replace('.', "-"));
    format!("{}.pdf", sanitize_filename(&host))
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
///
/// Over-long names are shortened to [`MAX_FILENAME_BYTES`], keeping a short
/// extension.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    let safe = if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    };
    truncate_filename(safe)
}

fn truncate_filename(name: String) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name;
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 && name.len() - dot <= MAX_EXTENSION_BYTES => name.split_at(dot),
        _ => (name.as_str(), ""),
    };
    let mut cut = MAX_FILENAME_BYTES - extension.len();
    while !stem.is_char_boundary(cut) {
        cut -= 1;
    }
    debug!(original_len = name.len(), "truncating long filename");
    format!("{}{extension}", &stem[..cut])
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
