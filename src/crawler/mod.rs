//! Crawler module for bounded, keyword-scored web traversal
//!
//! This module contains the core crawling logic, including:
//! - Page fetching over plain HTTP or a headless browser
//! - HTML parsing and link extraction
//! - Frontier bookkeeping (visited set, deadline)
//! - Level-order traversal with scoring and classification per page
//! - Whole-session orchestration from seeds to sinks

#[cfg(feature = "browser")]
mod browser;
mod engine;
mod fetcher;
mod frontier;
mod parser;
mod session;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use engine::{CrawlSettings, Crawler};
pub use fetcher::{build_fetcher, build_http_client, FetchError, HttpFetcher, PageFetcher};
pub use frontier::{CrawlTarget, Deadline, VisitedSet};
pub use parser::{parse_page, PageRecord, NO_TITLE};
pub use session::{
    gather_seeds, run_session, FailedWrite, SearchCredentials, SeedMode, SessionReport,
    SessionRequest,
};

use crate::classify::LinkCategory;
use crate::SieveError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One relevant page, the unit written to a sink
///
/// Identity is `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub title: String,
    pub url: String,
    pub category: LinkCategory,
    pub summary: String,
    pub score: f64,
}

impl LinkRecord {
    /// Creates a record, rounding the score to three decimals
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        category: LinkCategory,
        summary: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            category,
            summary: summary.into(),
            score: round_score(score),
        }
    }
}

fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStats {
    /// URLs this run claimed in the visited set
    pub claimed: usize,
    /// Successful fetches
    pub fetched: usize,
    /// Fetches that ended as dead ends
    pub failed: usize,
    /// Pages that met the relevance threshold
    pub relevant: usize,
    /// Frontier entries dropped because the URL was already claimed
    pub skipped_visited: usize,
    /// Whether the wall-clock budget cut the run short
    pub deadline_reached: bool,
    /// Depth levels that started processing
    pub levels: u32,
    pub elapsed: Duration,
}

/// Relevant pages bucketed by category, in discovery order
#[derive(Debug, Clone, Default)]
pub struct CrawlResults {
    pub open: Vec<LinkRecord>,
    pub form: Vec<LinkRecord>,
    pub stats: CrawlStats,
}

impl CrawlResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to the bucket for its category
    pub fn push(&mut self, record: LinkRecord) {
        match record.category {
            LinkCategory::Open => self.open.push(record),
            LinkCategory::Form => self.form.push(record),
        }
    }

    pub fn bucket(&self, category: LinkCategory) -> &[LinkRecord] {
        match category {
            LinkCategory::Open => &self.open,
            LinkCategory::Form => &self.form,
        }
    }

    pub fn total(&self) -> usize {
        self.open.len() + self.form.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Splits comma separated operator input into keywords
///
/// Entries are trimmed and empty entries dropped.
///
/// # Example
///
/// ```
/// use sieve_crawl::crawler::parse_keywords;
///
/// let keywords = parse_keywords(" upi, payments ,, fraud").unwrap();
/// assert_eq!(keywords, vec!["upi", "payments", "fraud"]);
/// ```
pub fn parse_keywords(input: &str) -> Result<Vec<String>, SieveError> {
    let keywords: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    if keywords.is_empty() {
        return Err(SieveError::NoKeywords);
    }

    Ok(keywords)
}
