use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Running counters for a crawl, shared by all workers
#[derive(Debug, Default)]
pub struct CrawlStatistics {
    profiles_visited: AtomicUsize,
    websites_visited: AtomicUsize,
    feeds_found: AtomicUsize,
    fetch_failures: AtomicUsize,
    skipped: AtomicUsize,
    duplicates: AtomicUsize,
}

/// Point-in-time copy of the crawl counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub profiles_visited: usize,
    pub websites_visited: usize,
    pub feeds_found: usize,
    pub fetch_failures: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_profile(&self) {
        self.profiles_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_website(&self, feeds: usize) {
        self.websites_visited.fetch_add(1, Ordering::Relaxed);
        self.feeds_found.fetch_add(feeds, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicates(&self, count: usize) {
        self.duplicates.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            profiles_visited: self.profiles_visited.load(Ordering::Relaxed),
            websites_visited: self.websites_visited.load(Ordering::Relaxed),
            feeds_found: self.feeds_found.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
        }
    }

    pub fn write_to_log(&self, running_time: Duration) {
        let snapshot = self.snapshot();
        tracing::info!(
            profiles_visited = snapshot.profiles_visited,
            websites_visited = snapshot.websites_visited,
            feeds_found = snapshot.feeds_found,
            fetch_failures = snapshot.fetch_failures,
            skipped = snapshot.skipped,
            duplicates = snapshot.duplicates,
            running_time = ?running_time,
            "statistics"
        );
    }
}
