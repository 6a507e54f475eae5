//! Frontier bookkeeping for one crawl run
//!
//! This module handles:
//! - Crawl targets (URL as found, its normalized key, discovery depth)
//! - The visited set, with an atomic insert-before-fetch claim
//! - The wall-clock deadline that bounds the run

use crate::url::normalize_url;
use crate::UrlError;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

/// A URL scheduled for fetching, with the depth it was discovered at
///
/// The URL is fetched and reported as found, minus its fragment. Identity is
/// the normalized URL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    url: Url,
    key: String,
    depth: u32,
}

impl CrawlTarget {
    /// Validates `url`, derives its key and pins it to `depth`
    pub fn new(url: &str, depth: u32) -> Result<Self, UrlError> {
        let key = normalize_url(url)?.to_string();
        let mut url = Url::parse(url.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        url.set_fragment(None);

        Ok(Self { url, key, depth })
    }

    /// A depth-0 target
    pub fn seed(url: &str) -> Result<Self, UrlError> {
        Self::new(url, 0)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The identity string used by the visited set
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// URLs already dequeued for fetching during the current run
///
/// Shared by every in-flight visit; only the engine mutates it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panicking visit cannot leave the set half-updated
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the target's key; returns true only for the first caller
    ///
    /// Check and insert happen under one lock, so two concurrent visits of
    /// the same URL can never both win.
    pub fn claim(&self, target: &CrawlTarget) -> bool {
        self.lock().insert(target.key().to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Wall-clock budget established when a run starts
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// A deadline that has already passed
    pub fn elapsed_now() -> Self {
        Self { at: Instant::now() }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}
