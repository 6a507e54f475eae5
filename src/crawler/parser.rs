//! HTML parser for extracting page text, metadata, and outbound links
//!
//! Produces the transient [`PageRecord`] the scorer and classifier consume.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Title used when a page has no usable `<title>`
pub const NO_TITLE: &str = "(No Title)";

/// The result of fetching and parsing one URL
#[derive(Debug, Clone)]
pub struct PageRecord {
    /// URL the content was served from (after redirects)
    pub url: Url,

    /// Raw markup, used by the classifier
    pub html: String,

    /// `<title>` text, or [`NO_TITLE`]
    pub title: String,

    /// Text of the first paragraph, or empty
    pub summary: String,

    /// All paragraph texts joined with single spaces; the scoring input
    pub text: String,

    /// Absolute http(s) outbound links in first-seen order, no duplicates
    pub links: Vec<Url>,
}

/// Parses HTML content into a page record
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags, resolved against `base_url`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that is not `http`/`https` after resolution
///
/// # Example
///
/// ```
/// use sieve_crawl::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><p>Hi</p><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = parse_page(html.to_string(), base_url);
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_page(html: String, base_url: Url) -> PageRecord {
    let document = Html::parse_document(&html);

    let title = extract_title(&document).unwrap_or_else(|| NO_TITLE.to_string());
    let paragraphs = extract_paragraphs(&document);
    let summary = paragraphs
        .first()
        .map(|p| p.trim().to_string())
        .unwrap_or_default();
    let text = paragraphs.join(" ");
    let links = extract_links(&document, &base_url);

    PageRecord {
        url: base_url,
        html,
        title,
        summary,
        text,
        links,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the text of every `<p>` element in document order
fn extract_paragraphs(document: &Html) -> Vec<String> {
    let Ok(p_selector) = Selector::parse("p") else {
        return Vec::new();
    };

    document
        .select(&p_selector)
        .map(|element| element.text().collect::<String>())
        .collect()
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                if seen.insert(absolute_url.as_str().to_string()) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => Some(absolute_url),
        _ => None,
    }
}
