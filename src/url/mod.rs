//! URL handling module for Sieve-Crawl
//!
//! Provides the normalization that defines a crawl target's identity.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Returns true if the URL can be handed to a fetcher
pub fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
}
