//! Output module for writing crawl reports
//!
//! This module handles:
//! - Rendering the per-profile website and feed listing as markdown
//! - Exporting the same data as JSON
//! - Writing the chosen report to disk

mod json;
mod markdown;

pub use json::format_json_report;
pub use markdown::format_markdown_report;

use crate::config::ReportFormat;
use crate::crawler::CrawlOutcome;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Renders a crawl outcome in the requested format
pub fn format_report(
    outcome: &CrawlOutcome,
    format: ReportFormat,
    generated_at: DateTime<Utc>,
) -> OutputResult<String> {
    match format {
        ReportFormat::Markdown => Ok(format_markdown_report(outcome, generated_at)),
        ReportFormat::Json => format_json_report(outcome, generated_at),
    }
}

/// Writes a crawl report to `output_path`, replacing any existing file
///
/// # Arguments
///
/// * `outcome` - The finished crawl
/// * `output_path` - Path where the report should be written
/// * `format` - Markdown or JSON
pub fn write_report(
    outcome: &CrawlOutcome,
    output_path: &Path,
    format: ReportFormat,
) -> OutputResult<()> {
    let report = format_report(outcome, format, Utc::now())?;

    let mut file = File::create(output_path)?;
    file.write_all(report.as_bytes())?;

    tracing::debug!("Wrote {} byte report to {}", report.len(), output_path.display());
    Ok(())
}
