//! URL handling module for Feedhop
//!
//! This module provides the normalization used as the deduplication key for
//! crawl requests, and wildcard matching for the skip list.

mod matcher;
mod normalize;

use url::Url;

// Re-export main functions
pub use matcher::{is_skipped, matches_wildcard};
pub use normalize::normalize_url;

/// Extracts the lowercase host of a URL, if it has one
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the key under which a URL is recorded as visited
///
/// Two URLs with the same key are the same page for the purposes of the
/// crawl. URLs that cannot be normalized are keyed by their trimmed text so
/// they still deduplicate against themselves.
///
/// # Examples
///
/// ```
/// use feedhop::url::visit_key;
///
/// assert_eq!(visit_key("https://WWW.Example.com/blog/#top"), "https://example.com/blog");
/// assert_eq!(visit_key(" not a url "), "not a url");
/// ```
pub fn visit_key(url: &str) -> String {
    match normalize_url(url) {
        Ok(normalized) => normalized.to_string(),
        Err(_) => url.trim().to_string(),
    }
}
