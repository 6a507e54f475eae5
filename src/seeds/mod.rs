//! Seed providers
//!
//! Seeds come either from a web search API queried with keyword
//! conjunction/disjunction strings, or from the static `custom-domains` list.
//! Any failure here is reported before a crawl starts; a run with no seeds
//! does not start at all.

mod search;

pub use search::CustomSearchProvider;

use crate::url::is_crawlable;
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Errors obtaining seed URLs
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Search request failed: {0}")]
    Http(String),

    #[error("Search API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed search response: {0}")]
    Malformed(String),

    #[error("Missing search credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("No seed URLs obtained")]
    NoSeeds,
}

/// Returns candidate URLs for one query string
#[async_trait]
pub trait SeedProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Url>, SeedError>;
}

/// Fixed seed list, ignoring the query
#[derive(Debug, Clone, Default)]
pub struct StaticSeeds {
    urls: Vec<Url>,
}

impl StaticSeeds {
    pub fn new(urls: Vec<Url>) -> Self {
        Self { urls }
    }

    /// Parses configured domain strings, skipping any that are not http(s)
    pub fn from_domains(domains: &[String]) -> Self {
        let urls = domains
            .iter()
            .filter_map(|d| match Url::parse(d) {
                Ok(url) if is_crawlable(&url) => Some(url),
                _ => {
                    tracing::warn!("Ignoring custom domain {:?}", d);
                    None
                }
            })
            .collect();
        Self { urls }
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }
}

#[async_trait]
impl SeedProvider for StaticSeeds {
    async fn search(&self, _query: &str) -> Result<Vec<Url>, SeedError> {
        Ok(self.urls.clone())
    }
}

/// Builds the AND and OR query strings for `keywords`
///
/// # Example
///
/// ```
/// use sieve_crawl::seeds::build_queries;
///
/// let keywords = vec!["upi".to_string(), "fraud".to_string()];
/// assert_eq!(
///     build_queries(&keywords),
///     vec![r#""upi" AND "fraud""#, r#""upi" OR "fraud""#]
/// );
/// ```
pub fn build_queries(keywords: &[String]) -> Vec<String> {
    let quoted: Vec<String> = keywords.iter().map(|k| format!("\"{}\"", k)).collect();
    vec![quoted.join(" AND "), quoted.join(" OR ")]
}

/// Runs every query and unions the results in first-seen order
///
/// A failing query is logged and skipped. If every query fails, the first
/// error is returned; if the queries succeed but yield nothing,
/// [`SeedError::NoSeeds`].
pub async fn collect_seeds(
    provider: &dyn SeedProvider,
    keywords: &[String],
) -> Result<Vec<Url>, SeedError> {
    let mut seeds = Vec::new();
    let mut seen = HashSet::new();
    let mut first_error = None;
    let mut succeeded = 0;

    for query in build_queries(keywords) {
        match provider.search(&query).await {
            Ok(urls) => {
                succeeded += 1;
                tracing::info!("Query {} returned {} URLs", query, urls.len());
                for url in urls {
                    if seen.insert(url.as_str().to_string()) {
                        seeds.push(url);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Query {} failed: {}", query, e);
                first_error.get_or_insert(e);
            }
        }
    }

    if succeeded == 0 {
        if let Some(e) = first_error {
            return Err(e);
        }
    }

    if seeds.is_empty() {
        return Err(SeedError::NoSeeds);
    }

    Ok(seeds)
}
