//! Constants for the download module (timeouts, media type).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Media type a probe must report for a candidate to be downloaded.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Suffix used for in-flight downloads before they are renamed into place.
pub(crate) const PARTIAL_SUFFIX: &str = ".part";
