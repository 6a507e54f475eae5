//! Relevance scoring
//!
//! A [`Scorer`] pairs a pluggable [`SimilarityModel`] with the threshold that
//! is meaningful for that model. Lexical TF-IDF similarities typically land in
//! the 0.2 to 0.3 range for relevant pages, while embedding similarities need
//! their own empirically tuned cutoff, so the threshold is chosen per strategy.
//!
//! Scoring never fails from the caller's point of view: degenerate input or a
//! model error yields `Relevance { is_relevant: false, score: 0.0 }`.

mod embedding;
mod lexical;

pub use embedding::{EmbeddingModel, DEFAULT_MAX_INPUT_CHARS};
pub use lexical::{cosine_similarity, tokenize, LexicalModel};

use crate::config::{ScoringConfig, ScoringStrategy};
use crate::SieveError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors a similarity model can report for a single page
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Empty input text")]
    EmptyInput,

    #[error("Empty vocabulary: no scorable terms in page or keywords")]
    EmptyVocabulary,

    #[error("Zero vector: one side has no weight")]
    ZeroVector,

    #[error("Embedding dimensions differ: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("Embedding request failed: {0}")]
    Embedding(String),

    #[error("Similarity is not a finite number")]
    NotFinite,
}

/// Outcome of scoring one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relevance {
    pub is_relevant: bool,
    pub score: f64,
}

impl Relevance {
    pub fn irrelevant() -> Self {
        Self {
            is_relevant: false,
            score: 0.0,
        }
    }
}

/// A similarity measure between page text and the joined keyword phrase
#[async_trait]
pub trait SimilarityModel: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Similarity of `text` and `phrase`, higher is more similar
    async fn similarity(&self, text: &str, phrase: &str) -> Result<f64, ScoreError>;
}

/// Threshold-applying front end over a similarity model
#[derive(Clone)]
pub struct Scorer {
    model: Arc<dyn SimilarityModel>,
    threshold: f64,
}

impl Scorer {
    pub fn new(model: Arc<dyn SimilarityModel>, threshold: f64) -> Self {
        Self { model, threshold }
    }

    /// Builds the scorer selected by configuration
    ///
    /// The embedding strategy reads its bearer token from the environment
    /// variable named in the config; a missing variable sends unauthenticated
    /// requests (local embedding servers commonly need none).
    pub fn from_config(
        config: &ScoringConfig,
        client: reqwest::Client,
    ) -> Result<Self, SieveError> {
        let model: Arc<dyn SimilarityModel> = match config.strategy {
            ScoringStrategy::Lexical => Arc::new(LexicalModel::new()),
            ScoringStrategy::Embedding => {
                let embedding = config.embedding.as_ref().ok_or_else(|| {
                    crate::ConfigError::Validation(
                        "strategy 'embedding' requires a [scoring.embedding] table".to_string(),
                    )
                })?;
                let api_key = std::env::var(&embedding.api_key_env).ok();
                if api_key.is_none() {
                    tracing::warn!(
                        "{} is not set, embedding requests will be unauthenticated",
                        embedding.api_key_env
                    );
                }
                Arc::new(EmbeddingModel::new(
                    client,
                    &embedding.endpoint,
                    &embedding.model,
                    api_key,
                )
                .with_max_input_chars(embedding.max_input_chars))
            }
        };

        Ok(Self::new(model, config.threshold()))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Scores page text against the keyword list
    ///
    /// `is_relevant` is `score >= threshold`, inclusive.
    pub async fn score(&self, text: &str, keywords: &[String]) -> Relevance {
        let phrase = keywords.join(" ");

        match self.similarity(text, &phrase).await {
            Ok(score) => Relevance {
                is_relevant: score >= self.threshold,
                score,
            },
            Err(e) => {
                tracing::warn!("{} scoring failed: {}", self.model.name(), e);
                Relevance::irrelevant()
            }
        }
    }

    async fn similarity(&self, text: &str, phrase: &str) -> Result<f64, ScoreError> {
        if text.trim().is_empty() || phrase.trim().is_empty() {
            return Err(ScoreError::EmptyInput);
        }

        let score = self.model.similarity(text, phrase).await?;
        if !score.is_finite() {
            return Err(ScoreError::NotFinite);
        }
        Ok(score)
    }
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("model", &self.model.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}
