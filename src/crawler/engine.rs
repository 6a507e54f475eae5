//! Traversal engine - bounded level-order crawl
//!
//! Every URL at depth `d` is visited before any link discovered at depth `d`
//! is visited at depth `d + 1`. Within one level, up to `concurrency` visits
//! are in flight at once; their outcomes are folded back in discovery order.
//!
//! A visit claims its URL in the shared [`VisitedSet`] before fetching, so a
//! URL reachable by several paths is fetched at most once per run. The
//! deadline is checked before each visit and before each level; once it has
//! passed, no further fetches start and the results gathered so far are
//! returned.

use crate::classify::ClassifierRule;
use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{build_fetcher, build_http_client, PageFetcher};
use crate::crawler::frontier::{CrawlTarget, Deadline, VisitedSet};
use crate::crawler::parser::PageRecord;
use crate::crawler::{CrawlResults, LinkRecord};
use crate::scoring::Scorer;
use crate::state::NodeState;
use crate::SieveError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Immutable traversal bounds
#[derive(Debug, Clone, Copy)]
pub struct CrawlSettings {
    /// Inclusive; links found at this depth are not followed
    pub max_depth: u32,
    /// Wall-clock budget for one run
    pub timeout: Duration,
    /// Visits in flight per level
    pub concurrency: usize,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            timeout: config.crawl_timeout(),
            concurrency: config.max_concurrent_fetches as usize,
        }
    }
}

/// What happened to one frontier entry
#[derive(Debug)]
enum VisitOutcome {
    AlreadyVisited,
    DeadlineReached,
    Visited {
        state: NodeState,
        record: Option<LinkRecord>,
        links: Vec<Url>,
    },
}

/// Drives fetcher, scorer and classifier over the link graph
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    scorer: Scorer,
    rule: ClassifierRule,
    settings: CrawlSettings,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        scorer: Scorer,
        rule: ClassifierRule,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            fetcher,
            scorer,
            rule,
            settings,
        }
    }

    /// Builds the fetcher, scorer and bounds selected by configuration
    pub async fn from_config(config: &Config) -> Result<Self, SieveError> {
        let fetcher = build_fetcher(config).await?;
        let client = build_http_client(&config.user_agent, config.crawler.fetch_timeout())?;
        let scorer = Scorer::from_config(&config.scoring, client)?;

        tracing::info!(
            "Scoring with {} model, threshold {}",
            scorer.model_name(),
            scorer.threshold()
        );

        Ok(Self::new(
            fetcher,
            scorer,
            config.classifier.rule,
            CrawlSettings::from_config(&config.crawler),
        ))
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Crawls from `seeds` with a fresh visited set and a deadline starting now
    pub async fn crawl(&self, seeds: &[Url], keywords: &[String]) -> CrawlResults {
        let visited = VisitedSet::new();
        let deadline = Deadline::after(self.settings.timeout);
        self.crawl_with(seeds, keywords, &visited, deadline).await
    }

    /// Crawls from `seeds` against a caller-owned visited set and deadline
    ///
    /// URLs already in `visited` are skipped entirely.
    pub async fn crawl_with(
        &self,
        seeds: &[Url],
        keywords: &[String],
        visited: &VisitedSet,
        deadline: Deadline,
    ) -> CrawlResults {
        let start_time = Instant::now();
        let mut results = CrawlResults::new();

        let mut frontier: Vec<CrawlTarget> = seeds
            .iter()
            .filter_map(|url| match CrawlTarget::seed(url.as_str()) {
                Ok(target) => Some(target),
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", url, e);
                    None
                }
            })
            .collect();

        let concurrency = self.settings.concurrency.max(1);
        let mut depth = 0;

        while !frontier.is_empty() && depth <= self.settings.max_depth {
            if deadline.expired() {
                results.stats.deadline_reached = true;
                break;
            }

            tracing::info!("Depth {}: {} URLs in frontier", depth, frontier.len());
            results.stats.levels += 1;

            let outcomes: Vec<VisitOutcome> = stream::iter(frontier)
                .map(|target| self.visit(target, keywords, visited, deadline))
                .buffered(concurrency)
                .collect()
                .await;

            let mut next = Vec::new();
            let mut queued = HashSet::new();

            for outcome in outcomes {
                match outcome {
                    VisitOutcome::AlreadyVisited => results.stats.skipped_visited += 1,
                    VisitOutcome::DeadlineReached => results.stats.deadline_reached = true,
                    VisitOutcome::Visited {
                        state,
                        record,
                        links,
                    } => {
                        results.stats.claimed += 1;
                        if state.is_success() {
                            results.stats.fetched += 1;
                        } else {
                            results.stats.failed += 1;
                        }

                        if let Some(record) = record {
                            results.stats.relevant += 1;
                            results.push(record);
                        }

                        for link in links {
                            match CrawlTarget::new(link.as_str(), depth + 1) {
                                Ok(target) => {
                                    if queued.insert(target.key().to_string()) {
                                        next.push(target);
                                    }
                                }
                                Err(e) => tracing::debug!("Dropping link {}: {}", link, e),
                            }
                        }
                    }
                }
            }

            if results.stats.deadline_reached {
                break;
            }

            frontier = next;
            depth += 1;
        }

        if results.stats.deadline_reached {
            tracing::info!("Crawl deadline reached, returning partial results");
        }

        results.stats.elapsed = start_time.elapsed();
        tracing::info!(
            "Crawl finished: {} fetched, {} failed, {} relevant ({} open, {} form) in {:.1}s",
            results.stats.fetched,
            results.stats.failed,
            results.stats.relevant,
            results.open.len(),
            results.form.len(),
            results.stats.elapsed.as_secs_f64()
        );

        results
    }

    async fn visit(
        &self,
        target: CrawlTarget,
        keywords: &[String],
        visited: &VisitedSet,
        deadline: Deadline,
    ) -> VisitOutcome {
        if deadline.expired() {
            return VisitOutcome::DeadlineReached;
        }

        if !visited.claim(&target) {
            tracing::debug!("Already visited: {}", target.url());
            return VisitOutcome::AlreadyVisited;
        }

        let mut state = NodeState::Pending;
        state.advance(NodeState::Fetching);

        let page = match self.fetcher.fetch(target.url()).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Fetch failed for {}: {}", target.url(), e);
                state.advance(NodeState::FetchFailed);
                return VisitOutcome::Visited {
                    state,
                    record: None,
                    links: Vec::new(),
                };
            }
        };

        let PageRecord {
            html,
            title,
            summary,
            text,
            links,
            ..
        } = page;

        let relevance = self.scorer.score(&text, keywords).await;
        let category = self.rule.classify(&html);
        state.advance(NodeState::Scored);

        tracing::info!(
            "Visited: {} | relevance score: {:.3}",
            target.url(),
            relevance.score
        );

        let record = relevance.is_relevant.then(|| {
            tracing::debug!("Relevant ({}): {}", category, target.url());
            LinkRecord::new(title, target.url().as_str(), category, summary, relevance.score)
        });

        // Links found at the depth limit are not followed
        let links = if target.depth() < self.settings.max_depth {
            state.advance(NodeState::Expanded);
            links
        } else {
            Vec::new()
        };

        VisitOutcome::Visited {
            state,
            record,
            links,
        }
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("scorer", &self.scorer)
            .field("rule", &self.rule)
            .field("settings", &self.settings)
            .finish()
    }
}
