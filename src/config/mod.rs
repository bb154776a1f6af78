//! Configuration module for Feedhop
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: `Config::default()` is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use feedhop::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("feedhop.toml")).unwrap();
//! println!("Workers: {}", config.crawler.max_concurrent_pages_open);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DomainEntry, OutputConfig, ReportFormat, SelectorConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
