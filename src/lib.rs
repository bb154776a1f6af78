//! Feedhop: feed discovery for fediverse profile bios
//!
//! This crate runs a two-hop crawl. Each profile page is visited and the
//! website links in its bio fields are collected, then every website is
//! visited and the RSS/Atom feeds it advertises are recorded under the
//! profile that linked to it.

pub mod config;
pub mod crawler;
pub mod output;
pub mod seed;
pub mod url;

use thiserror::Error;

/// Main error type for Feedhop operations
#[derive(Debug, Error)]
pub enum FeedhopError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed error: {0}")]
    Seed(#[from] seed::SeedError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Queue error: {0}")]
    Queue(#[from] crawler::QueueError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid CSS selector for {name}: {message}")]
    InvalidSelector { name: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Feedhop operations
pub type Result<T> = std::result::Result<T, FeedhopError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{CrawlOutcome, CrawlResults, CrawlStatus, SiteResult};
pub use crate::seed::Seed;
pub use crate::url::{extract_domain, normalize_url, visit_key};
