//! Feedhop main entry point
//!
//! This is the command-line interface for the Feedhop feed finder.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use feedhop::config::{load_config_with_hash, Config, ReportFormat};
use feedhop::crawler::{Coordinator, CrawlStatus};
use feedhop::output::write_report;
use feedhop::seed::{read_seeds, Seed};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Feedhop: finds the feeds behind fediverse profile bios
///
/// Feedhop visits each profile listed in the input CSV, follows the website
/// links in the profile's bio fields, and records the RSS and Atom feeds
/// those websites advertise.
#[derive(Parser, Debug)]
#[command(name = "feedhop")]
#[command(version)]
#[command(about = "Finds RSS/Atom feeds linked from fediverse profile bios", long_about = None)]
struct Cli {
    /// CSV file whose first column holds handles (user@host) or profile URLs
    #[arg(value_name = "INPUT_CSV")]
    input: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the report (overrides the config file)
    #[arg(short, long, value_name = "REPORT")]
    output: Option<PathBuf>,

    /// Report format (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show which profiles would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Markdown,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let seeds = read_seeds(&cli.input)
        .with_context(|| format!("failed to read profiles from {}", cli.input.display()))?;

    let report_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.report_path));
    let format = cli.format.map(ReportFormat::from).unwrap_or(config.output.format);

    if cli.dry_run {
        handle_dry_run(&config, &seeds, &report_path, format);
        return Ok(());
    }

    handle_crawl(config, seeds, &report_path, format).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feedhop=info,warn"),
            1 => EnvFilter::new("feedhop=debug,info"),
            2 => EnvFilter::new("feedhop=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the settings and the profiles that would be crawled
fn handle_dry_run(config: &Config, seeds: &[Seed], report_path: &Path, format: ReportFormat) {
    println!("=== Feedhop Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent pages: {}",
        config.crawler.max_concurrent_pages_open
    );
    println!("  Settle timeout: {}ms", config.crawler.settle_timeout);
    println!("  Max queue size: {}", config.crawler.max_queue_size);

    println!("\nSelectors:");
    println!("  Profile links: {}", config.selectors.profile_links);
    println!("  Feed links: {}", config.selectors.feed_links);
    println!("  Feed types: {}", config.selectors.feed_types.join(", "));

    println!("\nOutput:");
    println!("  Report: {} ({:?})", report_path.display(), format);

    println!("\nSkipped Domains ({}):", config.skip.len());
    for entry in &config.skip {
        println!("  - {}", entry.domain);
    }

    let (valid, malformed): (Vec<&Seed>, Vec<&Seed>) =
        seeds.iter().partition(|seed| seed.request_url().is_ok());

    println!("\nProfiles ({}):", valid.len());
    for seed in &valid {
        println!("  - {} -> {}", seed.profile_id, seed.url);
    }

    if !malformed.is_empty() {
        println!("\nMalformed Handles ({}):", malformed.len());
        for seed in &malformed {
            println!("  - {}", seed.profile_id);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} profiles", valid.len());
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    seeds: Vec<Seed>,
    report_path: &Path,
    format: ReportFormat,
) -> anyhow::Result<()> {
    tracing::info!("Enqueuing {} profiles to scan", seeds.len());

    let coordinator = Coordinator::new(config).context("failed to build HTTP client")?;

    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for event: {:?}", error);
            return;
        }
        tracing::warn!("Interrupt received, finishing requests in flight");
        token.cancel();
    });

    let outcome = coordinator.run(seeds).await;

    write_report(&outcome, report_path, format)
        .with_context(|| format!("failed to write report {}", report_path.display()))?;
    tracing::info!("Done, wrote sites to {}", report_path.display());

    if let CrawlStatus::Aborted { reason } = &outcome.status {
        bail!("crawl aborted: {}", reason);
    }

    Ok(())
}
