//! Deduplication guard for crawl requests

use crate::url::visit_key;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Set of URLs already admitted into the crawl
///
/// URLs are compared by [`visit_key`]. Admission is atomic: for any key,
/// exactly one caller of [`VisitedSet::try_admit`] ever receives `true`.
/// Nothing is evicted during a run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the URL and returns true the first time it is seen
    pub fn try_admit(&self, url: &str) -> bool {
        let key = visit_key(url);
        // A poisoned set still holds every key inserted before the panic
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        let admitted = seen.insert(key);
        if !admitted {
            tracing::trace!("Already visited: {}", url);
        }
        admitted
    }

    /// Returns true if the URL has been admitted
    pub fn contains(&self, url: &str) -> bool {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.contains(&visit_key(url))
    }

    /// Number of distinct URLs admitted so far
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
