//! Output module for reporting crawl sessions
//!
//! This module handles:
//! - Printing per-session counts to the operator
//! - Generating markdown summaries of a session
//! - Dumping records no sink accepted, for a later retry
//! - Reporting what each sink already holds

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{
    load_sink_statistics, print_report, print_sink_statistics, report_line, SinkStatistics,
};

use crate::crawler::{CrawlStats, LinkRecord, SeedMode, SessionReport};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything the markdown summary shows about one session
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub keywords: Vec<String>,
    pub mode: SeedMode,
    pub seed_count: usize,
    pub stats: CrawlStats,
    pub open_added: Vec<LinkRecord>,
    pub form_added: Vec<LinkRecord>,
    pub pending: usize,
}

impl CrawlSummary {
    pub fn from_report(
        report: &SessionReport,
        keywords: &[String],
        mode: SeedMode,
        config_hash: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            config_hash: config_hash.to_string(),
            keywords: keywords.to_vec(),
            mode,
            seed_count: report.seed_count,
            stats: report.stats.clone(),
            open_added: report.open_added.clone(),
            form_added: report.form_added.clone(),
            pending: report.pending_records().len(),
        }
    }

    /// Share of successful fetches among all attempted (percent)
    pub fn success_rate(&self) -> f64 {
        if self.stats.claimed == 0 {
            0.0
        } else {
            (self.stats.fetched as f64 / self.stats.claimed as f64) * 100.0
        }
    }
}

/// Writes records as a pretty-printed JSON array
pub fn write_pending(path: &Path, records: &[LinkRecord]) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Reads records previously saved by [`write_pending`]
pub fn read_pending(path: &Path) -> OutputResult<Vec<LinkRecord>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
