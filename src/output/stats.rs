//! Operator-facing counts
//!
//! Prints the result of a session, and for `--stats`, how many links each
//! configured sink already holds.

use crate::classify::LinkCategory;
use crate::config::OutputConfig;
use crate::crawler::SessionReport;
use crate::sink::{open_sinks, SinkResult};

/// How many links one sink holds
#[derive(Debug, Clone, PartialEq)]
pub struct SinkStatistics {
    pub category: LinkCategory,
    pub location: String,
    pub links: usize,
}

/// Counts the keys in the open and form sinks
pub fn load_sink_statistics(config: &OutputConfig) -> SinkResult<Vec<SinkStatistics>> {
    let (open, form) = open_sinks(config)?;

    Ok(vec![
        SinkStatistics {
            category: LinkCategory::Open,
            location: open.describe(),
            links: open.existing_keys()?.len(),
        },
        SinkStatistics {
            category: LinkCategory::Form,
            location: form.describe(),
            links: form.existing_keys()?.len(),
        },
    ])
}

/// Prints sink statistics to stdout
pub fn print_sink_statistics(stats: &[SinkStatistics]) {
    println!("=== Sink Statistics ===\n");
    for sink in stats {
        println!("  {} links: {} ({})", sink.category, sink.links, sink.location);
    }
    println!();
    println!(
        "Total: {} links",
        stats.iter().map(|s| s.links).sum::<usize>()
    );
}

/// The one-line session result
pub fn report_line(report: &SessionReport) -> String {
    format!(
        "Added {} open links, {} form links.",
        report.open_added.len(),
        report.form_added.len()
    )
}

/// Prints the session result to stdout
pub fn print_report(report: &SessionReport) {
    let stats = &report.stats;

    println!("=== Crawl Report ===\n");
    println!("  Seeds: {}", report.seed_count);
    println!(
        "  Visited: {} ({} fetched, {} failed)",
        stats.claimed, stats.fetched, stats.failed
    );
    println!("  Relevant pages: {}", stats.relevant);
    println!("  Crawl time: {:.1}s", stats.elapsed.as_secs_f64());
    if stats.deadline_reached {
        println!("  Deadline reached: results are partial");
    }
    println!();

    for failed in &report.failed {
        println!(
            "  Could not write {} {} links: {}",
            failed.records.len(),
            failed.category,
            failed.error
        );
    }

    println!("{}", report_line(report));
}
