//! Page fetcher
//!
//! This module retrieves page content for the crawl engine:
//! - HEAD request to check the Content-Type is HTML
//! - GET request to fetch the page body as text
//! - Independent bounded retries for each of the two requests
//! - Classification of failures into outcome statistics

use crate::config::{Config, CrawlerConfig};
use crate::crawler::http::{HttpTransport, ReqwestTransport};
use crate::state::{CrawlState, Outcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Page body decoded as text
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received (empty if the header was missing)
        content_type: String,
    },

    /// Body bytes could not be decoded as text
    DecodeError {
        /// Error description
        error: String,
    },

    /// Every attempt failed with a connection error or timeout
    ConnectionError {
        /// Description of the last failure
        error: String,
    },
}

impl FetchResult {
    /// The statistic a failed fetch contributes; `None` for success
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Success { .. } => None,
            Self::ContentMismatch { content_type } => {
                Some(Outcome::WrongContentType(content_type.clone()))
            }
            Self::DecodeError { .. } => Some(Outcome::UnicodeDecodeError),
            Self::ConnectionError { .. } => Some(Outcome::ConnectionError),
        }
    }

    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body } => Some(body),
            _ => None,
        }
    }
}

/// Retry parameters shared by the HEAD and GET phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per phase
    pub max_attempts: u32,
    /// Pause after a transient failure (not after the last attempt)
    pub sleep_time: Duration,
    /// Bound on each individual request
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for RetryPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            sleep_time: config.sleep_time(),
            timeout: config.timeout(),
        }
    }
}

/// Content-type gated fetcher with bounded retries
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    limiter: Option<Arc<Semaphore>>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            limiter: None,
        }
    }

    /// Builds a reqwest-backed fetcher from configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        let fetcher = Self::new(Arc::new(transport), RetryPolicy::from(&config.crawler));

        Ok(match config.crawler.max_concurrent_fetches {
            Some(limit) => fetcher.with_concurrency_limit(limit),
            None => fetcher,
        })
    }

    /// Caps how many fetches (including their retries) run at once
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    /// Fetches page content, recording a statistic on failure
    ///
    /// Returns `None` when the page is not HTML, cannot be decoded, or could
    /// not be reached within the retry budget. The matching outcome has been
    /// recorded in `state` by then.
    pub async fn fetch(&self, url: &str, state: &CrawlState) -> Option<String> {
        let result = self.fetch_url(url).await;

        if let Some(outcome) = result.outcome() {
            state.record_outcome(outcome);
        }

        result.into_body()
    }

    /// Fetches a URL with full retry logic
    ///
    /// # Request Flow
    ///
    /// 1. Send HEAD to check Content-Type
    ///    - Not `text/html*` → ContentMismatch (no retry)
    /// 2. Send GET and decode the body
    ///    - Undecodable → DecodeError (no retry)
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Connection error / timeout on HEAD | Retry up to `max_attempts`, then ConnectionError |
    /// | Connection error / timeout on GET | Retry up to `max_attempts`, then ConnectionError |
    /// | Wrong Content-Type | Immediate → ContentMismatch |
    /// | Decode failure | Immediate → DecodeError |
    ///
    /// HEAD and GET each get their own attempt budget.
    pub async fn fetch_url(&self, url: &str) -> FetchResult {
        let _permit = match &self.limiter {
            // The semaphore is never closed
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        if let Err(rejected) = self.check_content_type(url).await {
            return rejected;
        }

        self.get_content(url).await
    }

    /// HEAD phase: `Ok(())` means the page is HTML
    async fn check_content_type(&self, url: &str) -> Result<(), FetchResult> {
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_attempts {
            match self.transport.head(url, self.policy.timeout).await {
                Ok(head) => {
                    if !(200..300).contains(&head.status) {
                        tracing::debug!("HEAD {} returned status {}", url, head.status);
                    }
                    let content_type = head.content_type.unwrap_or_default();
                    if content_type.starts_with("text/html") {
                        return Ok(());
                    }

                    tracing::debug!("Skipping {}: content type '{}'", url, content_type);
                    return Err(FetchResult::ContentMismatch { content_type });
                }
                Err(e) => {
                    tracing::debug!(
                        "HEAD {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.policy.max_attempts,
                        e
                    );
                    last_error = e.to_string();
                    self.pause_before_retry(attempt).await;
                }
            }
        }

        tracing::warn!("Giving up on {} after HEAD failures: {}", url, last_error);
        Err(FetchResult::ConnectionError { error: last_error })
    }

    /// GET phase
    async fn get_content(&self, url: &str) -> FetchResult {
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_attempts {
            match self.transport.get_text(url, self.policy.timeout).await {
                Ok(body) => return FetchResult::Success { body },
                Err(e) if !e.is_transient() => {
                    tracing::warn!("Could not decode {}: {}", url, e);
                    return FetchResult::DecodeError {
                        error: e.to_string(),
                    };
                }
                Err(e) => {
                    tracing::debug!(
                        "GET {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.policy.max_attempts,
                        e
                    );
                    last_error = e.to_string();
                    self.pause_before_retry(attempt).await;
                }
            }
        }

        tracing::warn!("Giving up on {} after GET failures: {}", url, last_error);
        FetchResult::ConnectionError { error: last_error }
    }

    async fn pause_before_retry(&self, attempt: u32) {
        if attempt < self.policy.max_attempts {
            tokio::time::sleep(self.policy.sleep_time).await;
        }
    }
}
