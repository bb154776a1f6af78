//! Markdown report generation
//!
//! This module renders the websites found in each profile's bio, and the
//! feeds those websites advertise, as a nested markdown list.

use crate::crawler::{CrawlOutcome, CrawlStatus};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Formats a crawl outcome as markdown
///
/// Profiles appear in seed order. A profile with no websites is still
/// listed so every input handle can be found in the report.
pub fn format_markdown_report(outcome: &CrawlOutcome, generated_at: DateTime<Utc>) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Bio Websites\n\n");
    let _ = writeln!(
        md,
        "_Generated {}_\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    match &outcome.status {
        CrawlStatus::Completed => {}
        CrawlStatus::Interrupted => {
            md.push_str("> **Note**: the crawl was interrupted; results are partial.\n\n");
        }
        CrawlStatus::Aborted { reason } => {
            let _ = writeln!(
                md,
                "> **Note**: the crawl was aborted ({}); results are partial.\n",
                reason
            );
        }
    }

    let sections: Vec<String> = outcome
        .results
        .iter()
        .map(|profile| {
            let mut section = format!("## {}\n\n", profile.profile_id);
            if profile.sites.is_empty() {
                section.push_str("_No websites found._\n");
            }
            for site in &profile.sites {
                let _ = writeln!(section, "- {}", site.site_url);
                for feed in &site.feed_urls {
                    let _ = writeln!(section, "   - Feed: {}", feed);
                }
            }
            section
        })
        .collect();
    md.push_str(&sections.join("\n"));

    if !outcome.warnings.is_empty() {
        md.push_str("\n## Skipped Handles\n\n");
        for warning in &outcome.warnings {
            let _ = writeln!(md, "- {}: {}", warning.profile_id, warning.reason);
        }
    }

    md
}
