//! Dense embedding cosine similarity via an OpenAI-compatible endpoint
//!
//! Both texts are embedded in a single `POST {endpoint}/embeddings` call.
//! Page text is cut to `max_input_chars` first, since endpoints reject inputs
//! over the model's token limit.

use crate::scoring::{ScoreError, SimilarityModel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Roughly 2k tokens of English text
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8000;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 2],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding model served over HTTP
#[derive(Debug, Clone)]
pub struct EmbeddingModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_input_chars: usize,
}

impl EmbeddingModel {
    pub fn new(client: Client, endpoint: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    async fn embed_pair(&self, text: &str, phrase: &str) -> Result<(Vec<f32>, Vec<f32>), ScoreError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: [truncate_chars(text, self.max_input_chars), phrase],
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ScoreError::Embedding(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScoreError::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| {
                ScoreError::Embedding(format!("malformed response: {}", e.without_url()))
            })?;

        if parsed.data.len() != 2 {
            return Err(ScoreError::Embedding(format!(
                "expected 2 embeddings, got {}",
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        let phrase_embedding = parsed.data.pop().map(|d| d.embedding).unwrap_or_default();
        let text_embedding = parsed.data.pop().map(|d| d.embedding).unwrap_or_default();

        Ok((text_embedding, phrase_embedding))
    }
}

#[async_trait]
impl SimilarityModel for EmbeddingModel {
    fn name(&self) -> &'static str {
        "embedding"
    }

    async fn similarity(&self, text: &str, phrase: &str) -> Result<f64, ScoreError> {
        let (a, b) = self.embed_pair(text, phrase).await?;
        dense_cosine(&a, &b)
    }
}

/// Longest prefix of `text` with at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn dense_cosine(a: &[f32], b: &[f32]) -> Result<f64, ScoreError> {
    if a.len() != b.len() {
        return Err(ScoreError::DimensionMismatch(a.len(), b.len()));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ScoreError::ZeroVector);
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_cosine() {
        assert!((dense_cosine(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-9);
        assert!(dense_cosine(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-9);
        assert!((dense_cosine(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dense_cosine_errors() {
        assert!(matches!(
            dense_cosine(&[1.0], &[1.0, 2.0]),
            Err(ScoreError::DimensionMismatch(1, 2))
        ));
        assert!(matches!(
            dense_cosine(&[0.0, 0.0], &[1.0, 2.0]),
            Err(ScoreError::ZeroVector)
        ));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let model = EmbeddingModel::new(Client::new(), "https://api.example.com/v1/", "m", None);
        assert_eq!(model.base_url, "https://api.example.com/v1");
        assert_eq!(model.max_input_chars, DEFAULT_MAX_INPUT_CHARS);
    }

    #[test]
    fn test_truncate_chars_on_char_boundary() {
        assert_eq!(truncate_chars("widgets", 3), "wid");
        assert_eq!(truncate_chars("widgets", 7), "widgets");
        assert_eq!(truncate_chars("widgets", 50), "widgets");
        assert_eq!(truncate_chars("ñandú ñu", 4), "ñand");
        assert_eq!(truncate_chars("", 4), "");
    }
}
