//! Configuration module for Sieve-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The loaded [`Config`] is immutable and passed explicitly to the crawl engine.
//!
//! # Example
//!
//! ```no_run
//! use sieve_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, CrawlerConfig, EmbeddingConfig, FetcherBackend, FetcherConfig,
    OutputConfig, ScoringConfig, ScoringStrategy, SearchConfig, SeedsConfig, SinkKind,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
