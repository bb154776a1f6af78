//! Hop handlers
//!
//! - [`ProfileHandler`] loads a profile page and queues its bio links
//! - [`WebsiteHandler`] loads a linked website and records its feeds
//! - [`SkipHandler`] is the default for requests that are deliberately ignored

use crate::config::Config;
use crate::crawler::aggregate::{ResultAggregate, SiteResult};
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::{extract_feed_links, extract_profile_links, ParseError};
use crate::crawler::queue::{QueueError, WorkQueue};
use crate::crawler::request::{RequestDescriptor, RequestLabel};
use crate::crawler::stats::CrawlStatistics;
use crate::url::is_skipped;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl HandlerError {
    /// Whether the error leaves the shared queue unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Queue(_))
    }
}

/// Shared state a handler works against
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct CrawlContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub queue: Arc<WorkQueue>,
    pub results: Arc<ResultAggregate>,
    pub stats: Arc<CrawlStatistics>,
    pub config: Arc<Config>,
}

/// Handles `ProfileVisit` requests
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileHandler;

impl ProfileHandler {
    pub async fn handle(
        &self,
        request: &RequestDescriptor,
        ctx: &CrawlContext,
    ) -> Result<(), HandlerError> {
        let profile = request.profile_id();
        tracing::info!("Scanning {}", profile);

        let document = ctx.fetcher.fetch(&request.url).await?;
        ctx.stats.record_profile();

        let links = extract_profile_links(&document, &ctx.config.selectors.profile_links)?;

        tracing::info!("Found {} links on {}'s profile", links.len(), profile);

        let batch: Vec<RequestDescriptor> = links
            .into_iter()
            .map(|link| {
                let label = if skip_link(&link, ctx) {
                    RequestLabel::Skip
                } else {
                    RequestLabel::WebsiteVisit
                };
                request.follow(link, label)
            })
            .collect();

        if batch.is_empty() {
            return Ok(());
        }

        let admission = ctx.queue.enqueue(batch)?;
        ctx.stats.record_duplicates(admission.duplicates);
        tracing::debug!(
            "Queued {} links from {} ({} already seen)",
            admission.admitted,
            profile,
            admission.duplicates
        );

        Ok(())
    }
}

fn skip_link(link: &str, ctx: &CrawlContext) -> bool {
    if ctx.config.skip.is_empty() {
        return false;
    }
    Url::parse(link)
        .map(|url| is_skipped(&url, &ctx.config.skip))
        .unwrap_or(false)
}

/// Handles `WebsiteVisit` requests
#[derive(Debug, Default, Clone, Copy)]
pub struct WebsiteHandler;

impl WebsiteHandler {
    pub async fn handle(
        &self,
        request: &RequestDescriptor,
        ctx: &CrawlContext,
    ) -> Result<(), HandlerError> {
        tracing::info!(
            "Looking for feeds in {} (by {})",
            request.url,
            request.profile_id()
        );

        let document = ctx.fetcher.fetch(&request.url).await?;

        let selectors = &ctx.config.selectors;
        let feed_urls =
            extract_feed_links(&document, &selectors.feed_links, &selectors.feed_types)?;

        ctx.stats.record_website(feed_urls.len());
        tracing::debug!("{} advertises {} feeds", request.url, feed_urls.len());

        ctx.results.append(
            request.profile_id(),
            SiteResult {
                site_url: request.url.clone(),
                feed_urls,
            },
        );

        Ok(())
    }
}

/// Default handler: records the request and does nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipHandler;

impl SkipHandler {
    pub fn handle(&self, request: &RequestDescriptor, ctx: &CrawlContext) {
        tracing::info!("Skipping {}", request.url);
        ctx.stats.record_skipped();
    }
}
