//! Page fetching
//!
//! This module defines the capability the crawler uses to load pages and
//! its HTTP implementation:
//! - Building the HTTP client with a descriptive user agent
//! - Bounding each fetch by the settle timeout
//! - Classifying failures (timeouts, unreachable hosts, HTTP errors, non-HTML)

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::parser::Document;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reasons a page could not be loaded
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Timed out waiting for {url} to load")]
    Timeout { url: String },

    #[error("Could not reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got '{content_type}'")]
    ContentMismatch { url: String, content_type: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// URL the failed fetch was for
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::Timeout { url }
            | Self::Unreachable { url, .. }
            | Self::Status { url, .. }
            | Self::ContentMismatch { url, .. }
            | Self::Body { url, .. } => url,
        }
    }
}

/// Loads pages for the crawler
///
/// A successful fetch returns a document whose content is complete and ready
/// to query. Implementations bound their own waiting; the crawler does not
/// retry failed fetches.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError>;
}

/// Formats the user agent string: `Name/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    if config.contact_email.is_empty() {
        format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, config.contact_url
        )
    } else {
        format!(
            "{}/{} (+{}; {})",
            config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
        )
    }
}

/// Builds an HTTP client with proper configuration
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(user_agent))
        .timeout(Duration::from_millis(crawler.settle_timeout))
        .connect_timeout(Duration::from_millis(crawler.connect_timeout))
        .redirect(Policy::limited(crawler.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP
///
/// A page counts as settled once its full body has arrived within the
/// client's timeout. Scripts are not executed.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the user agent and crawler settings
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if is_failure_status(status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            tracing::debug!("{} answered {}, reading the page anyway", url, status);
        }

        // Pages served without a Content-Type are given the benefit of the doubt
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.is_empty() && !is_html(&content_type) {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::trace!("Fetched {} ({} bytes)", final_url, body.len());
        Ok(Document::new(final_url, body))
    }
}

/// Statuses that mean the page itself is unavailable
///
/// Other error pages (404, 410, ...) are still documents and may carry feed
/// links in their head, so they are handed to the crawler like any page.
fn is_failure_status(status: StatusCode) -> bool {
    // 401, 403 and 429 mean the crawler was turned away rather than the page missing
    status.is_server_error() || matches!(status.as_u16(), 401 | 403 | 429)
}

fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Unreachable {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
