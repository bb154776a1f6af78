//! Seed list for a crawl run
//!
//! A seed pairs an opaque profile identifier with the URL of that profile's
//! page. Seeds are usually read from a CSV file of fediverse handles (see
//! [`read_seeds`]), but any caller can build them directly.

mod ingest;

pub use ingest::{parse_seeds, read_seeds};

use crate::UrlError;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Errors raised while reading the seed input
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV input: {0}")]
    Csv(#[from] csv::Error),
}

/// One profile to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    /// Identifier results are reported under (e.g. `user@host`)
    pub profile_id: String,

    /// Profile page URL; empty when none could be derived
    pub url: String,
}

impl Seed {
    /// Creates a seed from an identifier and a profile URL
    pub fn new(profile_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            profile_id: profile_id.into(),
            url: url.into(),
        }
    }

    /// Builds a seed from a fediverse handle or a profile URL
    ///
    /// `user@host` and `@user@host` map to `https://host/@user`. A value that
    /// already is an http(s) URL is used as both identifier and URL. Anything
    /// else keeps its identifier with an empty URL, which the crawler reports
    /// as a malformed seed. Returns `None` for blank input.
    ///
    /// # Examples
    ///
    /// ```
    /// use feedhop::seed::Seed;
    ///
    /// let seed = Seed::from_handle("@a@x.test").unwrap();
    /// assert_eq!(seed.profile_id, "a@x.test");
    /// assert_eq!(seed.url, "https://x.test/@a");
    /// ```
    pub fn from_handle(handle: &str) -> Option<Self> {
        let handle = handle.trim();
        if handle.is_empty() {
            return None;
        }

        if handle.starts_with("https://") || handle.starts_with("http://") {
            return Some(Self::new(handle, handle));
        }

        let profile_id = handle.strip_prefix('@').unwrap_or(handle);
        if profile_id.is_empty() {
            return None;
        }

        let url = match profile_id.split_once('@') {
            Some((user, host)) if is_valid_part(user) && is_valid_part(host) => {
                format!("https://{}/@{}", host, user)
            }
            _ => String::new(),
        };

        Some(Self::new(profile_id, url))
    }

    /// Parses the seed's URL, rejecting anything that cannot be fetched
    ///
    /// A seed without a profile identifier is rejected too, since its
    /// results could not be attributed to anyone.
    pub fn request_url(&self) -> Result<Url, UrlError> {
        if self.profile_id.trim().is_empty() {
            return Err(UrlError::Malformed(format!(
                "no profile identifier for '{}'",
                self.url
            )));
        }

        if self.url.trim().is_empty() {
            return Err(UrlError::Malformed(format!(
                "no profile URL for '{}'",
                self.profile_id
            )));
        }

        let url = Url::parse(self.url.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::MissingDomain);
        }

        Ok(url)
    }
}

/// A seed that was not crawled because its URL or identifier is unusable
///
/// The profile still appears in the results, with no websites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedWarning {
    pub profile_id: String,
    pub url: String,
    pub reason: String,
}

fn is_valid_part(part: &str) -> bool {
    !part.is_empty() && !part.contains(|c: char| c.is_whitespace() || c == '/' || c == '@')
}
