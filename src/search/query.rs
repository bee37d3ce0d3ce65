//! Search query construction.

/// File-type restriction appended to every query term.
pub const PDF_FILETYPE_SUFFIX: &str = "filetype:pdf";

/// Builds the search query from comma-separated terms.
///
/// Each non-blank term is suffixed with `filetype:pdf` and the terms are
/// OR'd together: `"a, b"` becomes `"a filetype:pdf OR b filetype:pdf"`.
/// Returns `None` when no non-blank term remains.
#[must_use]
pub fn build_search_query(raw: &str) -> Option<String> {
    let terms: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("{term} {PDF_FILETYPE_SUFFIX}"))
        .collect();

    (!terms.is_empty()).then(|| terms.join(" OR "))
}
