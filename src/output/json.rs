use crate::crawler::{CrawlOutcome, CrawlResults, CrawlStatus, StatsSnapshot};
use crate::output::OutputResult;
use crate::seed::SeedWarning;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    status: &'a CrawlStatus,
    profiles: &'a CrawlResults,
    warnings: &'a [SeedWarning],
    stats: &'a StatsSnapshot,
}

/// Formats a crawl outcome as pretty-printed JSON
pub fn format_json_report(
    outcome: &CrawlOutcome,
    generated_at: DateTime<Utc>,
) -> OutputResult<String> {
    let report = JsonReport {
        generated_at,
        status: &outcome.status,
        profiles: &outcome.results,
        warnings: &outcome.warnings,
        stats: &outcome.stats,
    };

    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    Ok(json)
}
