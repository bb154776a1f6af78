//! Crawler module for the two-hop feed discovery crawl
//!
//! This module contains the core crawling logic, including:
//! - Request descriptors and their labels
//! - The shared work queue and visited set (one visit per URL)
//! - Label-based routing to the profile and website handlers
//! - Per-profile result aggregation
//! - Overall crawl coordination with a pool of workers

mod aggregate;
mod coordinator;
mod fetcher;
mod handlers;
mod parser;
mod queue;
mod request;
mod router;
mod stats;
mod visited;

pub use aggregate::{CrawlResults, ProfileSites, ResultAggregate, SiteResult};
pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, CrawlStatus};
pub use fetcher::{build_http_client, user_agent_string, FetchError, HttpFetcher, PageFetcher};
pub use handlers::{
    CrawlContext, HandlerError, ProfileHandler, SkipHandler, WebsiteHandler,
};
pub use parser::{
    extract_feed_links, extract_profile_links, resolve_link, Document, Element, ParseError,
};
pub use queue::{Admission, Lease, QueueError, WorkQueue};
pub use request::{RequestContext, RequestDescriptor, RequestLabel};
pub use router::Router;
pub use stats::{CrawlStatistics, StatsSnapshot};
pub use visited::VisitedSet;

use crate::config::Config;
use crate::seed::Seed;
use crate::FeedhopError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher from the configuration
/// 2. Create a result entry for every seed and queue the profile pages
/// 3. Visit profiles and the websites linked from their bios
/// 4. Return the feeds found, grouped by profile
pub async fn crawl(config: Config, seeds: Vec<Seed>) -> Result<CrawlOutcome, FeedhopError> {
    run_crawl(config, seeds).await
}
