//! Result sinks and the dedupe writer
//!
//! One sink per output category, each keyed by URL. [`write_new`] filters a
//! batch against the sink's existing keys and against itself, then appends
//! what is left in one call.

mod csv_sink;
mod schema;
mod sqlite;

pub use csv_sink::CsvSink;
pub use sqlite::SqliteSink;

use crate::config::{OutputConfig, SinkKind};
use crate::crawler::LinkRecord;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading or writing a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Persisted store of link records for one category
pub trait ResultSink: Send {
    /// Short description for logs
    fn describe(&self) -> String;

    /// URLs already persisted
    fn existing_keys(&self) -> SinkResult<HashSet<String>>;

    /// Appends a batch of records
    fn append(&mut self, records: &[LinkRecord]) -> SinkResult<()>;
}

/// Appends the records not already persisted and returns exactly those
///
/// Within `records`, only the first occurrence of a URL is kept. No append
/// call is made when nothing is left.
pub fn write_new(
    sink: &mut dyn ResultSink,
    records: &[LinkRecord],
) -> SinkResult<Vec<LinkRecord>> {
    let mut seen = sink.existing_keys()?;

    let fresh: Vec<LinkRecord> = records
        .iter()
        .filter(|r| seen.insert(r.url.clone()))
        .cloned()
        .collect();

    if fresh.is_empty() {
        tracing::debug!("Nothing new for {}", sink.describe());
        return Ok(fresh);
    }

    sink.append(&fresh)?;
    tracing::info!("Appended {} records to {}", fresh.len(), sink.describe());

    Ok(fresh)
}

/// Opens the open and form sinks named by `[output]`
pub fn open_sinks(
    config: &OutputConfig,
) -> SinkResult<(Box<dyn ResultSink>, Box<dyn ResultSink>)> {
    Ok((
        open_sink(config.sink, Path::new(&config.open_path))?,
        open_sink(config.sink, Path::new(&config.form_path))?,
    ))
}

fn open_sink(kind: SinkKind, path: &Path) -> SinkResult<Box<dyn ResultSink>> {
    Ok(match kind {
        SinkKind::Sqlite => Box::new(SqliteSink::new(path)?),
        SinkKind::Csv => Box::new(CsvSink::new(path)),
    })
}

/// In-memory sink for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<LinkRecord>,
    append_calls: usize,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose store already holds `records`
    pub fn with_records(records: Vec<LinkRecord>) -> Self {
        Self {
            records,
            append_calls: 0,
        }
    }

    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls
    }
}

#[cfg(test)]
impl ResultSink for MemorySink {
    fn describe(&self) -> String {
        "memory sink".to_string()
    }

    fn existing_keys(&self) -> SinkResult<HashSet<String>> {
        Ok(self.records.iter().map(|r| r.url.clone()).collect())
    }

    fn append(&mut self, records: &[LinkRecord]) -> SinkResult<()> {
        self.append_calls += 1;
        self.records.extend_from_slice(records);
        Ok(())
    }
}
