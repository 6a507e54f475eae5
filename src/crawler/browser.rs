//! Scripted headless browser fetcher
//!
//! Renders each page in headless Chromium so that script-generated markup and
//! links are visible to the scorer and classifier. The rendered DOM goes
//! through the same parser as plain HTTP responses.

use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::parser::{parse_page, PageRecord};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launches a headless browser and drives its event loop on a task
    pub async fn launch(timeout: Duration) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder().build().map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!("Headless browser launched");

        Ok(Self {
            browser,
            handler,
            timeout,
        })
    }
}

/// Navigates an open tab and returns its rendered DOM and final URL
async fn render(page: &Page, url: &Url) -> Result<(String, Url), FetchError> {
    page.goto(url.as_str())
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?;

    page.wait_for_navigation()
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?;

    let html = page
        .content()
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?;

    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .and_then(|u| Url::parse(&u).ok())
        .unwrap_or_else(|| url.clone());

    Ok((html, final_url))
}

/// Runs `work` under `limit`, then `cleanup` whatever the outcome
async fn bounded_then<T, W, C>(limit: Duration, work: W, cleanup: C) -> Result<T, FetchError>
where
    W: Future<Output = Result<T, FetchError>>,
    C: Future<Output = ()>,
{
    let result = match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    };
    cleanup.await;
    result
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageRecord, FetchError> {
        let page = tokio::time::timeout(self.timeout, self.browser.new_page("about:blank"))
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let tab = page.clone();
        let close = async move {
            if let Err(e) = tab.close().await {
                tracing::debug!("Failed to close page for {}: {}", url, e);
            }
        };
        let (html, final_url) = bounded_then(self.timeout, render(&page, url), close).await?;

        if html.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(parse_page(html, final_url))
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
