use serde::Deserialize;

/// Main configuration structure for Feedhop
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub skip: Vec<DomainEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of workers processing requests concurrently
    #[serde(rename = "max-concurrent-pages-open")]
    pub max_concurrent_pages_open: u32,

    /// Upper bound for a page to finish loading (milliseconds)
    #[serde(rename = "settle-timeout")]
    pub settle_timeout: u64,

    /// Upper bound for establishing a connection (milliseconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Maximum number of redirects followed per fetch
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Capacity of the pending request backlog
    #[serde(rename = "max-queue-size")]
    pub max_queue_size: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages_open: 8,
            settle_timeout: 30_000,
            connect_timeout: 10_000,
            max_redirects: 10,
            max_queue_size: 10_000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact (may be empty)
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "feedhop".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/feedhop/feedhop".to_string(),
            contact_email: String::new(),
        }
    }
}

/// CSS selectors used to extract links from fetched pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Links inside the profile's bio fields
    #[serde(rename = "profile-links")]
    pub profile_links: String,

    /// Candidate feed `<link>` elements on a website
    #[serde(rename = "feed-links")]
    pub feed_links: String,

    /// MIME types accepted as feeds (compared case-insensitively)
    #[serde(rename = "feed-types")]
    pub feed_types: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            profile_links: ".account__header__fields a".to_string(),
            feed_links: r#"link[rel~="alternate"][href]"#.to_string(),
            feed_types: vec![
                "application/rss+xml".to_string(),
                "application/atom+xml".to_string(),
            ],
        }
    }
}

/// Report format written at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the report file
    #[serde(rename = "report-path")]
    pub report_path: String,

    /// Format of the report file
    pub format: ReportFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: "websites.md".to_string(),
            format: ReportFormat::Markdown,
        }
    }
}

/// Domain entry for the skip list
#[derive(Debug, Clone, Deserialize)]
pub struct DomainEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,
}
