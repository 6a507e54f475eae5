//! One complete crawl session: seeds, traversal, persistence
//!
//! Seed failures abort the session before any page is fetched. Sink failures
//! happen after the traversal; the records that could not be written are kept
//! in the report and dumped to `pending-path` so they can be re-tried.

use crate::classify::LinkCategory;
use crate::config::Config;
use crate::crawler::engine::Crawler;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::{CrawlResults, CrawlStats, LinkRecord};
use crate::output::write_pending;
use crate::seeds::{collect_seeds, CustomSearchProvider, SeedProvider, StaticSeeds};
use crate::sink::{open_sinks, write_new, ResultSink, SinkError};
use crate::SieveError;
use std::path::Path;
use url::Url;

/// Where seed URLs come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SeedMode {
    /// Web search with AND/OR keyword queries
    #[default]
    Search,
    /// The configured `custom-domains` list
    Domains,
}

/// Search API credentials, usually from the environment
#[derive(Debug, Clone, Default)]
pub struct SearchCredentials {
    pub api_key: Option<String>,
    pub engine_id: Option<String>,
}

/// Operator input for one session
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub keywords: Vec<String>,
    pub mode: SeedMode,
    pub credentials: SearchCredentials,
}

/// A batch a sink refused
#[derive(Debug, Clone)]
pub struct FailedWrite {
    pub category: LinkCategory,
    pub error: String,
    pub records: Vec<LinkRecord>,
}

/// What a session did, for reporting to the operator
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub seed_count: usize,
    pub stats: CrawlStats,
    pub open_added: Vec<LinkRecord>,
    pub form_added: Vec<LinkRecord>,
    pub failed: Vec<FailedWrite>,
}

impl SessionReport {
    pub fn new(seed_count: usize, stats: CrawlStats) -> Self {
        Self {
            seed_count,
            stats,
            ..Self::default()
        }
    }

    /// Writes both buckets through the dedupe writer, recording failures
    pub fn persist(
        &mut self,
        results: &CrawlResults,
        open: &mut dyn ResultSink,
        form: &mut dyn ResultSink,
    ) {
        self.persist_bucket(LinkCategory::Open, &results.open, open);
        self.persist_bucket(LinkCategory::Form, &results.form, form);
    }

    fn persist_bucket(
        &mut self,
        category: LinkCategory,
        records: &[LinkRecord],
        sink: &mut dyn ResultSink,
    ) {
        match write_new(sink, records) {
            Ok(added) => match category {
                LinkCategory::Open => self.open_added = added,
                LinkCategory::Form => self.form_added = added,
            },
            Err(e) => self.fail(category, records, &e),
        }
    }

    /// Marks every record of `results` as unwritten
    pub fn fail_all(&mut self, results: &CrawlResults, error: &SinkError) {
        self.fail(LinkCategory::Open, &results.open, error);
        self.fail(LinkCategory::Form, &results.form, error);
    }

    fn fail(&mut self, category: LinkCategory, records: &[LinkRecord], error: &SinkError) {
        tracing::error!("Failed to write {} links: {}", category, error);
        if records.is_empty() {
            return;
        }
        self.failed.push(FailedWrite {
            category,
            error: error.to_string(),
            records: records.to_vec(),
        });
    }

    /// Records that relevant pages produced but no sink accepted
    pub fn pending_records(&self) -> Vec<LinkRecord> {
        self.failed
            .iter()
            .flat_map(|f| f.records.iter().cloned())
            .collect()
    }

    pub fn added(&self, category: LinkCategory) -> &[LinkRecord] {
        match category {
            LinkCategory::Open => &self.open_added,
            LinkCategory::Form => &self.form_added,
        }
    }
}

/// Obtains seed URLs for the requested mode
///
/// Search mode requires both credentials; their absence is reported before
/// any request is sent.
pub async fn gather_seeds(config: &Config, request: &SessionRequest) -> Result<Vec<Url>, SieveError> {
    let provider: Box<dyn SeedProvider> = match request.mode {
        SeedMode::Search => {
            let client = build_http_client(&config.user_agent, config.crawler.fetch_timeout())?;
            Box::new(CustomSearchProvider::new(
                client,
                &config.search.endpoint,
                request.credentials.api_key.clone(),
                request.credentials.engine_id.clone(),
            )?)
        }
        SeedMode::Domains => Box::new(StaticSeeds::from_domains(&config.seeds.custom_domains)),
    };

    let seeds = collect_seeds(provider.as_ref(), &request.keywords).await?;
    tracing::info!("Collected {} seed URLs", seeds.len());
    Ok(seeds)
}

/// Runs a full session against the sinks named in `[output]`
pub async fn run_session(config: &Config, request: SessionRequest) -> Result<SessionReport, SieveError> {
    if request.keywords.is_empty() {
        return Err(SieveError::NoKeywords);
    }

    let seeds = gather_seeds(config, &request).await?;
    let crawler = Crawler::from_config(config).await?;
    let results = crawler.crawl(&seeds, &request.keywords).await;

    let mut report = SessionReport::new(seeds.len(), results.stats.clone());
    match open_sinks(&config.output) {
        Ok((mut open, mut form)) => report.persist(&results, open.as_mut(), form.as_mut()),
        Err(e) => report.fail_all(&results, &e),
    }

    let pending = report.pending_records();
    if !pending.is_empty() {
        let path = Path::new(&config.output.pending_path);
        match write_pending(path, &pending) {
            Ok(()) => tracing::warn!(
                "{} unwritten links saved to {}",
                pending.len(),
                path.display()
            ),
            Err(e) => tracing::error!("Failed to save unwritten links: {}", e),
        }
    }

    Ok(report)
}
