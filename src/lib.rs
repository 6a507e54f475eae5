//! Sieve-Crawl: a keyword-driven relevance crawler
//!
//! This crate seeds a crawl from a search API or a static domain list, follows
//! hyperlinks up to a bounded depth within a wall-clock budget, scores every
//! visited page against a keyword list, classifies relevant pages as "open" or
//! "form" gated, and appends newly discovered links to per-category sinks.

pub mod classify;
pub mod config;
pub mod crawler;
pub mod output;
pub mod scoring;
pub mod seeds;
pub mod sink;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sieve-Crawl operations
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Seed provider error: {0}")]
    Seed(#[from] seeds::SeedError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No keywords given (expected a comma separated list)")]
    NoKeywords,

    #[error("Browser fetcher unavailable: {0}")]
    BrowserUnavailable(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sieve-Crawl operations
pub type Result<T> = std::result::Result<T, SieveError>;

// Re-export commonly used types
pub use classify::{classify, ClassifierRule, LinkCategory};
pub use config::Config;
pub use crawler::{CrawlResults, Crawler, LinkRecord};
pub use scoring::{Relevance, Scorer};
pub use state::NodeState;
pub use url::normalize_url;
