//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives one crawl through its lifecycle:
//! - Seeding: one result entry per profile, profile pages queued
//! - Draining: a pool of workers dispatching queued requests until no work
//!   is pending or in flight
//! - Finished: the collected results are handed back to the caller
//!
//! Fetch failures are contained per request. A failure of the work queue
//! itself ends the crawl early, and whatever was collected is still returned.

use crate::config::Config;
use crate::crawler::aggregate::{CrawlResults, ResultAggregate};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::handlers::CrawlContext;
use crate::crawler::queue::WorkQueue;
use crate::crawler::request::RequestDescriptor;
use crate::crawler::router::Router;
use crate::crawler::stats::{CrawlStatistics, StatsSnapshot};
use crate::seed::{Seed, SeedWarning};
use crate::FeedhopError;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Lifecycle stage of a crawl; stages only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CrawlPhase {
    Seeding,
    Draining,
    Finished,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seeding => "seeding",
            Self::Draining => "draining",
            Self::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Every queued request was processed
    Completed,

    /// The crawl was cancelled; pending requests were abandoned
    Interrupted,

    /// The work queue failed; pending requests were abandoned
    Aborted { reason: String },
}

impl CrawlStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Interrupted => f.write_str("interrupted"),
            Self::Aborted { reason } => write!(f, "aborted ({})", reason),
        }
    }
}

/// Everything a finished crawl hands back
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// One entry per seeded profile, in seed order
    pub results: CrawlResults,
    pub status: CrawlStatus,
    /// Seeds that could not be crawled
    pub warnings: Vec<SeedWarning>,
    pub stats: StatsSnapshot,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    router: Router,
    token: CancellationToken,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a coordinator that fetches pages over HTTP
    pub fn new(config: Config) -> Result<Self, FeedhopError> {
        let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Creates a coordinator around any page fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            router: Router::new(),
            token: CancellationToken::new(),
            phase: CrawlPhase::Seeding,
        }
    }

    /// Token that interrupts the crawl when cancelled
    ///
    /// Workers stop taking new requests; requests already being fetched
    /// finish within the fetcher's own timeout.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    fn enter(&mut self, phase: CrawlPhase) {
        debug_assert!(phase > self.phase, "crawl phases only move forward");
        tracing::debug!("Crawl phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Runs the crawl to completion
    ///
    /// The returned results hold an entry for every seeded profile, even when
    /// the crawl was interrupted or aborted.
    pub async fn run(mut self, seeds: Vec<Seed>) -> CrawlOutcome {
        let started = Instant::now();

        let results = Arc::new(ResultAggregate::new(
            seeds.iter().map(|seed| seed.profile_id.clone()),
        ));
        let queue = Arc::new(WorkQueue::new(self.config.crawler.max_queue_size));
        let stats = Arc::new(CrawlStatistics::new());

        let (requests, warnings) = seed_requests(&seeds);
        tracing::info!(
            "Seeding {} profiles ({} skipped as malformed)",
            requests.len(),
            warnings.len()
        );

        let abort_reason = Arc::new(OnceLock::new());
        match queue.enqueue(requests) {
            Ok(admission) => stats.record_duplicates(admission.duplicates),
            Err(e) => {
                tracing::error!("Failed to queue profiles: {}", e);
                let _ = abort_reason.set(e.to_string());
                queue.close();
            }
        }

        let ctx = CrawlContext {
            fetcher: Arc::clone(&self.fetcher),
            queue: Arc::clone(&queue),
            results: Arc::clone(&results),
            stats: Arc::clone(&stats),
            config: Arc::clone(&self.config),
        };

        self.enter(CrawlPhase::Draining);
        let workers = self.config.crawler.max_concurrent_pages_open.max(1) as usize;
        let tracker = TaskTracker::new();
        for id in 0..workers {
            tracker.spawn(worker(
                id,
                self.router,
                ctx.clone(),
                self.token.clone(),
                Arc::clone(&abort_reason),
            ));
        }
        tracker.close();
        tracker.wait().await;
        drop(ctx);

        self.enter(CrawlPhase::Finished);
        let status = if let Some(reason) = abort_reason.get() {
            CrawlStatus::Aborted {
                reason: reason.clone(),
            }
        } else if self.token.is_cancelled() && !queue.is_drained() {
            let abandoned = queue.close();
            tracing::warn!("Crawl interrupted, {} requests abandoned", abandoned);
            CrawlStatus::Interrupted
        } else {
            CrawlStatus::Completed
        };

        stats.write_to_log(started.elapsed());
        tracing::info!("Crawl {}", status);

        // Workers have exited, so this is the only handle left
        let results = match Arc::try_unwrap(results) {
            Ok(aggregate) => aggregate.finish(),
            Err(shared) => shared.snapshot(),
        };

        CrawlOutcome {
            results,
            status,
            warnings,
            stats: stats.snapshot(),
        }
    }
}

/// Builds the first-hop requests, setting malformed seeds aside
fn seed_requests(seeds: &[Seed]) -> (Vec<RequestDescriptor>, Vec<SeedWarning>) {
    let mut requests = Vec::with_capacity(seeds.len());
    let mut warnings = Vec::new();

    for seed in seeds {
        match seed.request_url() {
            Ok(_) => requests.push(RequestDescriptor::profile(seed.url.trim(), &seed.profile_id)),
            Err(e) => {
                tracing::warn!("Not crawling {}: {}", seed.profile_id, e);
                warnings.push(SeedWarning {
                    profile_id: seed.profile_id.clone(),
                    url: seed.url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (requests, warnings)
}

async fn worker(
    id: usize,
    router: Router,
    ctx: CrawlContext,
    token: CancellationToken,
    abort_reason: Arc<OnceLock<String>>,
) {
    loop {
        let lease = match ctx.queue.next(&token).await {
            Ok(Some(lease)) => lease,
            Ok(None) => break,
            Err(e) => {
                abort(&ctx, &token, &abort_reason, e.to_string());
                break;
            }
        };

        let request = lease.request();
        if let Err(e) = router.dispatch(request, &ctx).await {
            if e.is_fatal() {
                abort(&ctx, &token, &abort_reason, e.to_string());
                break;
            }
            ctx.stats.record_failure();
            tracing::warn!(
                url = %request.url,
                profile = %request.profile_id(),
                "Failed to process {} request: {}",
                request.label,
                e
            );
        }
    }

    tracing::trace!("Worker {} exiting", id);
}

fn abort(
    ctx: &CrawlContext,
    token: &CancellationToken,
    abort_reason: &OnceLock<String>,
    reason: String,
) {
    // Only the first failure is reported; later ones follow from the closed queue
    if abort_reason.set(reason.clone()).is_err() {
        return;
    }
    tracing::error!("Aborting crawl: {}", reason);
    let abandoned = ctx.queue.close();
    if abandoned > 0 {
        tracing::warn!("{} pending requests abandoned", abandoned);
    }
    token.cancel();
}

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It builds the HTTP
/// fetcher from the configuration and returns the crawl outcome.
pub async fn run_crawl(config: Config, seeds: Vec<Seed>) -> Result<CrawlOutcome, FeedhopError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run(seeds).await)
}
