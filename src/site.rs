//! Site-key normalization for counters and output filenames.

use url::Url;

/// Derive a site key from a URL: hostname with a leading `www.` stripped,
/// first dot-separated label. Falls back to `"local"` when the URL has no
/// usable hostname (e.g. `file:` URLs).
pub fn site_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    let host = host.strip_prefix("www.").unwrap_or(host);
    match host.split('.').next() {
        Some(label) if !label.is_empty() => label.to_ascii_lowercase(),
        _ => "local".to_string(),
    }
}

/// Whether a raw URL string points at an HTTP(S) page that can be captured.
pub fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Extract the hostname from a raw URL string, if it parses and has one.
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}
