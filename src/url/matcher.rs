use crate::config::DomainEntry;
use crate::url::extract_domain;
use url::Url;

/// Checks if a domain matches a wildcard pattern
///
/// `"example.com"` matches only itself. `"*.example.com"` matches the bare
/// domain and any subdomain of it, at any depth.
///
/// # Examples
///
/// ```
/// use feedhop::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "notexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Checks whether a URL points at a domain on the skip list
///
/// URLs without a host never match. A leading `www.` on the URL is ignored.
pub fn is_skipped(url: &Url, skip: &[DomainEntry]) -> bool {
    let Some(domain) = extract_domain(url) else {
        return false;
    };
    let domain = domain.strip_prefix("www.").unwrap_or(&domain);

    skip.iter()
        .any(|entry| matches_wildcard(&entry.domain, domain))
}
