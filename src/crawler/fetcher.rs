//! Page fetchers
//!
//! This module defines the [`PageFetcher`] seam the crawl engine drives and
//! its implementations:
//! - [`HttpFetcher`]: plain HTTP via reqwest
//! - `BrowserFetcher`: scripted headless Chromium (cargo feature `browser`)
//!
//! Both return a fully parsed [`PageRecord`] whose links are already resolved
//! to absolute http(s) URLs. Per-request timeouts are enforced here, not by
//! the engine.

use crate::config::{Config, FetcherBackend, UserAgentConfig};
use crate::crawler::parser::{parse_page, PageRecord};
use crate::SieveError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a single URL could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Expected HTML, got {0}")]
    NotHtml(String),

    #[error("Empty response body")]
    EmptyBody,

    #[error("Browser error: {0}")]
    Browser(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Fetches one URL and returns its parsed content
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<PageRecord, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// The user agent has the form `CrawlerName/Version (+ContactURL; ContactEmail)`.
///
/// # Example
///
/// ```no_run
/// use sieve_crawl::config::UserAgentConfig;
/// use sieve_crawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "SieveCrawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// # Outcome mapping
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with HTML (or no Content-Type) | parsed page |
    /// | non-2xx | `Status(code)` |
    /// | Content-Type present but not HTML | `NotHtml` |
    /// | empty body | `EmptyBody` |
    /// | timeout | `Timeout` |
    /// | connection refused / DNS / TLS | `Connect` |
    async fn fetch(&self, url: &Url) -> Result<PageRecord, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        if let Some(content_type) = content_type {
            if !content_type.contains("html") {
                return Err(FetchError::NotHtml(content_type));
            }
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(parse_page(body, final_url))
    }
}

/// Builds the fetcher selected by `[fetcher] backend`
pub async fn build_fetcher(config: &Config) -> Result<Arc<dyn PageFetcher>, SieveError> {
    let timeout = config.crawler.fetch_timeout();

    match config.fetcher.backend {
        FetcherBackend::Http => {
            let client = build_http_client(&config.user_agent, timeout)?;
            Ok(Arc::new(HttpFetcher::new(client)))
        }
        FetcherBackend::Browser => build_browser_fetcher(timeout).await,
    }
}

#[cfg(feature = "browser")]
async fn build_browser_fetcher(timeout: Duration) -> Result<Arc<dyn PageFetcher>, SieveError> {
    let fetcher = crate::crawler::browser::BrowserFetcher::launch(timeout).await?;
    Ok(Arc::new(fetcher))
}

#[cfg(not(feature = "browser"))]
async fn build_browser_fetcher(_timeout: Duration) -> Result<Arc<dyn PageFetcher>, SieveError> {
    Err(SieveError::BrowserUnavailable(
        "this binary was built without the `browser` feature".to_string(),
    ))
}
