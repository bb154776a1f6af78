//! Request descriptors flowing through the work queue

use std::fmt;

/// Which handler processes a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestLabel {
    /// First hop: a profile page whose bio links are collected
    ProfileVisit,

    /// Second hop: a website whose feed links are collected
    WebsiteVisit,

    /// A request the crawl deliberately does not process
    Skip,
}

impl fmt::Display for RequestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProfileVisit => "profile",
            Self::WebsiteVisit => "website",
            Self::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// Per-request context carried across hops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Profile whose results this request contributes to
    pub profile_id: String,
}

/// A unit of work in the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Absolute URL to fetch
    pub url: String,
    pub label: RequestLabel,
    pub context: RequestContext,
}

impl RequestDescriptor {
    /// Creates a request with an explicit label
    pub fn new(url: impl Into<String>, label: RequestLabel, profile_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label,
            context: RequestContext {
                profile_id: profile_id.into(),
            },
        }
    }

    /// Creates a first-hop request for a profile page
    pub fn profile(url: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self::new(url, RequestLabel::ProfileVisit, profile_id)
    }

    /// Creates a request discovered from this one, attributed to the same profile
    pub fn follow(&self, url: impl Into<String>, label: RequestLabel) -> Self {
        Self::new(url, label, self.context.profile_id.clone())
    }

    /// Profile this request is attributed to
    pub fn profile_id(&self) -> &str {
        &self.context.profile_id
    }
}
