//! Crawler coordinator - recursive traversal of one site
//!
//! Every traversal call claims its URL, fetches it, buffers the record and,
//! while depth remains, launches one child call per newly discovered in-scope
//! link. A parent joins all of its children before it counts as done, so the
//! whole crawl is a single future tree rooted at the seed.

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{HtmlParser, PageParser};
use crate::crawler::progress::{ProgressObserver, SilentProgress};
use crate::state::{CrawlState, CrawlStats, Outcome};
use crate::storage::{PageRecord, RecordStore};
use crate::url::{base_domain, is_in_scope, normalize, resolve};
use crate::SpiderError;
use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;

/// Final counters of a finished crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Scope of the crawl, derived from the seed
    pub base_domain: String,
    /// Traversal tasks that finished
    pub done: usize,
    /// Traversal tasks that were scheduled (seed included)
    pub total: usize,
    /// Distinct URLs a fetch was attempted for
    pub visited: usize,
    pub stats: CrawlStats,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Fetcher,
    parser: Box<dyn PageParser>,
    observer: Arc<dyn ProgressObserver>,
    store: Arc<dyn RecordStore>,
    flush_threshold: usize,
}

impl Coordinator {
    /// Creates a coordinator with the default HTML parser and no progress output
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher used for every page
    /// * `store` - Destination of the scraped records
    /// * `flush_threshold` - Buffered records that trigger a write-back
    pub fn new(fetcher: Fetcher, store: Arc<dyn RecordStore>, flush_threshold: usize) -> Self {
        Self {
            fetcher,
            parser: Box::new(HtmlParser::new()),
            observer: Arc::new(SilentProgress),
            store,
            flush_threshold,
        }
    }

    /// Creates a coordinator backed by a reqwest transport built from `config`
    pub fn from_config(config: &Config, store: Arc<dyn RecordStore>) -> Result<Self, SpiderError> {
        let fetcher = Fetcher::from_config(config)?;
        Ok(Self::new(fetcher, store, config.crawler.flush_threshold))
    }

    pub fn with_parser(mut self, parser: impl PageParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Crawls from `seed` down to `depth` hops and writes every scraped page
    ///
    /// The seed is normalized first and its base domain bounds the crawl.
    /// Buffered records are flushed before returning, even when the traversal
    /// itself failed; the first error encountered is returned.
    ///
    /// # Errors
    ///
    /// * `SpiderError::Url` - the seed has no usable host
    /// * `SpiderError::Storage` - a batch could not be written
    pub async fn run(&self, seed: &str, depth: u32) -> Result<CrawlReport, SpiderError> {
        let seed = normalize(seed);
        let base_domain = base_domain(&seed)?;

        tracing::info!(
            "Starting crawl of {} (base domain: {}, depth: {})",
            seed,
            base_domain,
            depth
        );

        let traversal = Traversal {
            coordinator: self,
            base_domain,
            state: CrawlState::new(self.store.clone(), self.flush_threshold),
        };

        let scraped = traversal.scrape(seed, depth).await;
        self.observer.finish();
        let flushed = traversal.state.flush().await;

        scraped?;
        flushed?;

        let report = traversal.report();
        tracing::info!(
            "Crawl finished: {}/{} tasks done, {} pages visited",
            report.done,
            report.total,
            report.visited
        );

        Ok(report)
    }
}

/// Per-crawl context shared by every traversal call
struct Traversal<'a> {
    coordinator: &'a Coordinator,
    base_domain: String,
    state: CrawlState,
}

impl Traversal<'_> {
    /// One traversal call
    ///
    /// Boxed because the future is recursive.
    fn scrape(&self, url: String, depth: u32) -> BoxFuture<'_, Result<(), SpiderError>> {
        async move {
            if !self.state.claim(&url) {
                tracing::debug!("Already visited {}", url);
                self.state.record_outcome(Outcome::Scrapped);
                self.state.complete_task();
                return Ok(());
            }

            let Some(content) = self.coordinator.fetcher.fetch(&url, &self.state).await else {
                self.state.complete_task();
                return Ok(());
            };

            let page = self.coordinator.parser.parse(&content);
            let title = page.title.unwrap_or_default();
            tracing::debug!("Scraped {} (\"{}\")", url, title);
            self.state
                .append(PageRecord::new(url.as_str(), title, content))
                .await?;

            if depth > 0 {
                let children = self.discover(&url, page.links);
                let results = join_all(
                    children
                        .into_iter()
                        .map(|link| self.scrape(link, depth - 1)),
                )
                .await;

                for result in results {
                    result?;
                }
            }

            self.state.record_outcome(Outcome::Done);
            let (done, total) = self.state.complete_task();
            self.coordinator.observer.on_progress(done, total);
            Ok(())
        }
        .boxed()
    }

    /// Turns raw hrefs into the child URLs this page is responsible for
    ///
    /// Each returned URL has been marked pending and counted as scheduled.
    fn discover(&self, page_url: &str, hrefs: Vec<String>) -> Vec<String> {
        let mut children = Vec::new();

        for href in hrefs {
            if href.is_empty() {
                continue;
            }

            let candidate = if href.starts_with('/') {
                match resolve(&href, page_url) {
                    Ok(absolute) => absolute,
                    Err(e) => {
                        tracing::debug!("Discarding link {}: {}", href, e);
                        continue;
                    }
                }
            } else {
                href
            };

            // Root-relative links resolve onto this page's host, but `//host/...`
            // may leave the scope, so every candidate is checked.
            if !is_in_scope(&candidate, &self.base_domain) {
                tracing::trace!("Out of scope: {}", candidate);
                continue;
            }

            let link = normalize(&candidate);
            if self.state.mark_pending(&link) {
                self.state.schedule_child();
                children.push(link);
            }
        }

        children
    }

    fn report(&self) -> CrawlReport {
        let (done, total) = self.state.progress();
        CrawlReport {
            base_domain: self.base_domain.clone(),
            done,
            total,
            visited: self.state.visited_count(),
            stats: self.state.stats(),
        }
    }
}
