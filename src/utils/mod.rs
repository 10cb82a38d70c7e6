//! Utility functions and helpers.

use url::Url;

/// Append path segments to a base URL.
///
/// The base's own path is kept (`http://host/api` + `["universities", "42"]`
/// gives `http://host/api/universities/42`). Segments are percent-encoded, and
/// a trailing empty segment produces a trailing slash.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, String> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| format!("base URL {base} cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Parse a base URL string.
pub fn parse_base(base_url: &str) -> Result<Url, url::ParseError> {
    Url::parse(base_url.trim())
}

/// Trimmed identifier, or `None` when it is blank.
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
