//! CSV link sink
//!
//! A spreadsheet-style file with header `title,url,category,summary,score`;
//! the URL column is the key.

use crate::crawler::LinkRecord;
use crate::sink::{ResultSink, SinkResult};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const HEADER: [&str; 5] = ["title", "url", "category", "summary", "score"];
const URL_COLUMN: usize = 1;

#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// The file is created on first append
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn has_content(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }
}

impl ResultSink for CsvSink {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn existing_keys(&self) -> SinkResult<HashSet<String>> {
        if !self.has_content() {
            return Ok(HashSet::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut keys = HashSet::new();
        for row in reader.records() {
            if let Some(url) = row?.get(URL_COLUMN) {
                if !url.is_empty() {
                    keys.insert(url.to_string());
                }
            }
        }
        Ok(keys)
    }

    fn append(&mut self, records: &[LinkRecord]) -> SinkResult<()> {
        let write_header = !self.has_content();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(HEADER)?;
        }

        for record in records {
            let score = format!("{:.3}", record.score);
            writer.write_record([
                record.title.as_str(),
                record.url.as_str(),
                record.category.as_str(),
                record.summary.as_str(),
                score.as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}
