use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sieve-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub seeds: SeedsConfig,
    pub output: OutputConfig,
}

/// Traversal bounds
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Inclusive recursion bound; depths `0..=max_depth` are processed
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Wall-clock budget for one crawl run (seconds)
    #[serde(rename = "crawl-timeout", default = "default_crawl_timeout")]
    pub crawl_timeout: u64,

    /// Number of page visits in flight at once
    #[serde(
        rename = "max-concurrent-fetches",
        default = "default_max_concurrent_fetches"
    )]
    pub max_concurrent_fetches: u32,

    /// Per-request timeout handed to the fetcher (seconds)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
}

impl CrawlerConfig {
    pub fn crawl_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl_timeout)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

fn default_crawl_timeout() -> u64 {
    5 * 60
}

fn default_max_concurrent_fetches() -> u32 {
    4
}

fn default_fetch_timeout() -> u64 {
    10
}

/// Which fetch technology drives the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetcherBackend {
    #[default]
    Http,
    Browser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetcherConfig {
    #[serde(default)]
    pub backend: FetcherBackend,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Relevance scoring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    /// TF-IDF vector cosine similarity
    #[default]
    Lexical,
    /// Dense embedding cosine similarity
    Embedding,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub strategy: ScoringStrategy,

    #[serde(rename = "lexical-threshold", default = "default_lexical_threshold")]
    pub lexical_threshold: f64,

    #[serde(
        rename = "embedding-threshold",
        default = "default_embedding_threshold"
    )]
    pub embedding_threshold: f64,

    #[serde(default)]
    pub embedding: Option<EmbeddingConfig>,
}

impl ScoringConfig {
    /// The threshold that applies to the selected strategy
    pub fn threshold(&self) -> f64 {
        match self.strategy {
            ScoringStrategy::Lexical => self.lexical_threshold,
            ScoringStrategy::Embedding => self.embedding_threshold,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::default(),
            lexical_threshold: default_lexical_threshold(),
            embedding_threshold: default_embedding_threshold(),
            embedding: None,
        }
    }
}

fn default_lexical_threshold() -> f64 {
    0.2
}

fn default_embedding_threshold() -> f64 {
    0.3
}

/// OpenAI-compatible embeddings endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL; `/embeddings` is appended
    pub endpoint: String,

    pub model: String,

    /// Environment variable holding the bearer token
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Page text beyond this many characters is cut before embedding
    #[serde(rename = "max-input-chars", default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_input_chars() -> usize {
    crate::scoring::DEFAULT_MAX_INPUT_CHARS
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub rule: crate::classify::ClassifierRule,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Custom search JSON API endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

/// Static seed list used when crawling without search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedsConfig {
    #[serde(rename = "custom-domains", default)]
    pub custom_domains: Vec<String>,
}

/// Persistence backend for discovered links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    #[default]
    Sqlite,
    Csv,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub sink: SinkKind,

    /// Store for relevant open links
    #[serde(rename = "open-path")]
    pub open_path: String,

    /// Store for relevant form-gated links
    #[serde(rename = "form-path")]
    pub form_path: String,

    /// Optional markdown report of the run
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,

    /// Where records a sink rejected are dumped for a retry
    #[serde(rename = "pending-path", default = "default_pending_path")]
    pub pending_path: String,
}

fn default_pending_path() -> String {
    "pending_links.json".to_string()
}
