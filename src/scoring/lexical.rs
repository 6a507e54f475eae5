//! TF-IDF cosine similarity over the two-document corpus {page, keywords}
//!
//! Weighting follows the common smoothed scheme: raw term counts, smoothed
//! idf `ln((1 + n) / (1 + df)) + 1`, then L2 normalization per document.
//! Tokens are lowercase runs of two or more word characters.

use crate::scoring::{ScoreError, SimilarityModel};
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Lexical vector similarity
#[derive(Debug, Clone, Default)]
pub struct LexicalModel;

impl LexicalModel {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core, exposed for callers outside an async context
    pub fn score_pair(&self, text: &str, phrase: &str) -> Result<f64, ScoreError> {
        let docs = [term_counts(text), term_counts(phrase)];

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &docs {
            for term in doc.keys() {
                *document_frequency.entry(term.as_str()).or_default() += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(ScoreError::EmptyVocabulary);
        }

        let n = docs.len() as f64;
        let idf: HashMap<&str, f64> = document_frequency
            .iter()
            .map(|(term, df)| (*term, ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0))
            .collect();

        let vectors: Vec<HashMap<&str, f64>> = docs
            .iter()
            .map(|doc| {
                doc.iter()
                    .map(|(term, count)| (term.as_str(), *count as f64 * idf[term.as_str()]))
                    .collect()
            })
            .collect();

        cosine_similarity(&vectors[0], &vectors[1])
    }
}

#[async_trait]
impl SimilarityModel for LexicalModel {
    fn name(&self) -> &'static str {
        "lexical"
    }

    async fn similarity(&self, text: &str, phrase: &str) -> Result<f64, ScoreError> {
        self.score_pair(text, phrase)
    }
}

/// Splits text into lowercase tokens of at least two word characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

/// Cosine similarity of two sparse vectors
pub fn cosine_similarity(a: &HashMap<&str, f64>, b: &HashMap<&str, f64>) -> Result<f64, ScoreError> {
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ScoreError::ZeroVector);
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();

    Ok(dot / (norm_a * norm_b))
}
