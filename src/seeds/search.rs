//! Web search seed provider (Google Custom Search JSON shape)

use crate::seeds::{SeedError, SeedProvider};
use crate::url::is_crawlable;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

/// Queries `GET {endpoint}?q=..&key=..&cx=..` and reads `items[].link`
///
/// The request URL carries the API key, so it is stripped from every error.
#[derive(Debug, Clone)]
pub struct CustomSearchProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl CustomSearchProvider {
    /// Fails with `MissingCredentials` before any request is made
    pub fn new(
        client: Client,
        endpoint: &str,
        api_key: Option<String>,
        engine_id: Option<String>,
    ) -> Result<Self, SeedError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(SeedError::MissingCredentials("API key"))?;
        let engine_id = engine_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(SeedError::MissingCredentials("search engine ID"))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            engine_id,
        })
    }
}

#[async_trait]
impl SeedProvider for CustomSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<Url>, SeedError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SeedError::Http(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SeedError::Malformed(e.without_url().to_string()))?;

        let urls = parsed
            .items
            .into_iter()
            .filter_map(|item| item.link)
            .filter_map(|link| match Url::parse(&link) {
                Ok(url) if is_crawlable(&url) => Some(url),
                _ => {
                    tracing::debug!("Skipping search result {:?}", link);
                    None
                }
            })
            .collect();

        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials() {
        let result = CustomSearchProvider::new(
            Client::new(),
            "https://search.test/",
            None,
            Some("cx".to_string()),
        );
        assert!(matches!(result, Err(SeedError::MissingCredentials("API key"))));

        let result = CustomSearchProvider::new(
            Client::new(),
            "https://search.test/",
            Some("key".to_string()),
            Some("  ".to_string()),
        );
        assert!(matches!(
            result,
            Err(SeedError::MissingCredentials("search engine ID"))
        ));
    }

    #[test]
    fn test_response_without_items() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"kind": "x"}"#).unwrap();
        assert!(parsed.items.is_empty());
    }

    // Request/response behaviour is covered with wiremock in the integration tests
}
