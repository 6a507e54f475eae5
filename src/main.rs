//! Sieve-Crawl main entry point
//!
//! This is the command-line interface for the Sieve-Crawl relevance crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use sieve_crawl::config::{load_config_with_hash, Config};
use sieve_crawl::crawler::{
    parse_keywords, run_session, SearchCredentials, SeedMode, SessionRequest,
};
use sieve_crawl::output::{
    generate_markdown_summary, load_sink_statistics, print_report, print_sink_statistics,
    CrawlSummary,
};
use sieve_crawl::seeds::build_queries;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Sieve-Crawl: a keyword-driven relevance crawler
///
/// Seeds a crawl from web search results or a fixed domain list, follows
/// links to a bounded depth, scores each page against the keywords and
/// records relevant pages as open or form-gated links.
#[derive(Parser, Debug)]
#[command(name = "sieve-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A keyword-driven relevance crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Comma separated keywords, e.g. "upi, payments, fraud"
    #[arg(short, long, required_unless_present = "stats")]
    keywords: Option<String>,

    /// Where seed URLs come from
    #[arg(long, value_enum, default_value_t = SeedMode::Search)]
    mode: SeedMode,

    /// Search API key
    #[arg(long, env = "SIEVE_SEARCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Search engine ID
    #[arg(long, env = "SIEVE_SEARCH_ENGINE_ID")]
    engine_id: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show how many links each sink holds and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let keywords = parse_keywords(cli.keywords.as_deref().unwrap_or_default())?;
    let request = SessionRequest {
        keywords,
        mode: cli.mode,
        credentials: SearchCredentials {
            api_key: cli.api_key,
            engine_id: cli.engine_id,
        },
    };

    if cli.dry_run {
        handle_dry_run(&config, &request);
        Ok(())
    } else {
        handle_crawl(&config, request, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sieve_crawl=info,warn"),
            1 => EnvFilter::new("sieve_crawl=debug,info"),
            2 => EnvFilter::new("sieve_crawl=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, request: &SessionRequest) {
    println!("=== Sieve-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Crawl timeout: {}s", config.crawler.crawl_timeout);
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout);
    println!("  Fetcher: {:?}", config.fetcher.backend);

    println!("\nScoring:");
    println!("  Strategy: {:?}", config.scoring.strategy);
    println!("  Threshold: {}", config.scoring.threshold());
    println!("  Classifier rule: {:?}", config.classifier.rule);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Sink: {:?}", config.output.sink);
    println!("  Open links: {}", config.output.open_path);
    println!("  Form links: {}", config.output.form_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\nKeywords: {}", request.keywords.join(", "));
    match request.mode {
        SeedMode::Search => {
            println!("\nSearch queries ({}):", config.search.endpoint);
            for query in build_queries(&request.keywords) {
                println!("  - {}", query);
            }
            let has_credentials =
                request.credentials.api_key.is_some() && request.credentials.engine_id.is_some();
            println!(
                "  Credentials: {}",
                if has_credentials { "present" } else { "MISSING" }
            );
        }
        SeedMode::Domains => {
            println!(
                "\nCustom Domains ({}):",
                config.seeds.custom_domains.len()
            );
            for domain in &config.seeds.custom_domains {
                println!("  - {}", domain);
            }
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows how many links each sink holds
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let stats = load_sink_statistics(&config.output).context("Failed to open sinks")?;
    print_sink_statistics(&stats);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    request: SessionRequest,
    config_hash: &str,
) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let keywords = request.keywords.clone();
    let mode = request.mode;

    tracing::info!(
        "Starting crawl for [{}] (max depth {}, timeout {}s)",
        keywords.join(", "),
        config.crawler.max_depth,
        config.crawler.crawl_timeout
    );

    let report = run_session(config, request).await.context("Crawl failed")?;

    print_report(&report);

    if let Some(summary_path) = &config.output.summary_path {
        let summary = CrawlSummary::from_report(&report, &keywords, mode, config_hash, started_at);
        match generate_markdown_summary(&summary, Path::new(summary_path)) {
            Ok(()) => tracing::info!("Summary written to {}", summary_path),
            Err(e) => tracing::error!("Failed to write summary: {}", e),
        }
    }

    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} links could not be written; see {}",
            report.pending_records().len(),
            config.output.pending_path
        );
    }

    Ok(())
}
