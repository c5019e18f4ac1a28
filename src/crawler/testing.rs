//! Test doubles shared by the crawler unit tests

use crate::crawler::http::{HeadResponse, HttpTransport, TransportError};
use crate::state::CrawlState;
use crate::storage::SqliteStorage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned responses for one URL
///
/// Call `n` gets entry `n` of a sequence; once a sequence runs out its last
/// entry is repeated.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedPage {
    heads: Vec<Result<HeadResponse, TransportError>>,
    bodies: Vec<Result<String, TransportError>>,
}

impl ScriptedPage {
    pub(crate) fn html(body: &str) -> Self {
        Self {
            heads: vec![Ok(HeadResponse::new(200, Some("text/html")))],
            bodies: vec![Ok(body.to_string())],
        }
    }

    pub(crate) fn with_content_type(self, content_type: &str) -> Self {
        self.with_head(Ok(HeadResponse::new(200, Some(content_type))))
    }

    pub(crate) fn with_head(self, head: Result<HeadResponse, TransportError>) -> Self {
        self.with_head_sequence(vec![head])
    }

    pub(crate) fn with_head_sequence(
        mut self,
        heads: Vec<Result<HeadResponse, TransportError>>,
    ) -> Self {
        self.heads = heads;
        self
    }

    pub(crate) fn with_body(self, body: Result<String, TransportError>) -> Self {
        self.with_body_sequence(vec![body])
    }

    pub(crate) fn with_body_sequence(mut self, bodies: Vec<Result<String, TransportError>>) -> Self {
        self.bodies = bodies;
        self
    }
}

fn nth<T: Clone>(script: &[T], n: usize) -> Option<T> {
    script.get(n.min(script.len().saturating_sub(1))).cloned()
}

/// In-memory `HttpTransport` serving scripted pages
///
/// Unknown URLs fail with a connection error.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    pages: HashMap<String, ScriptedPage>,
    head_calls: Mutex<HashMap<String, usize>>,
    get_calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn html(self, url: &str, body: &str) -> Self {
        self.page(url, ScriptedPage::html(body))
    }

    pub(crate) fn page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub(crate) fn head_calls(&self, url: &str) -> usize {
        self.head_calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn get_calls(&self, url: &str) -> usize {
        self.get_calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Total number of GET requests across all URLs
    pub(crate) fn total_gets(&self) -> usize {
        self.get_calls.lock().unwrap().values().sum()
    }

    fn bump(calls: &Mutex<HashMap<String, usize>>, url: &str) -> usize {
        let mut calls = calls.lock().unwrap();
        let count = calls.entry(url.to_string()).or_insert(0);
        *count += 1;
        *count - 1
    }

    fn unknown(url: &str) -> TransportError {
        TransportError::Connection(format!("no route to {}", url))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn head(&self, url: &str, _timeout: Duration) -> Result<HeadResponse, TransportError> {
        let n = Self::bump(&self.head_calls, url);
        self.pages
            .get(url)
            .and_then(|page| nth(&page.heads, n))
            .unwrap_or_else(|| Err(Self::unknown(url)))
    }

    async fn get_text(&self, url: &str, _timeout: Duration) -> Result<String, TransportError> {
        let n = Self::bump(&self.get_calls, url);
        self.pages
            .get(url)
            .and_then(|page| nth(&page.bodies, n))
            .unwrap_or_else(|| Err(Self::unknown(url)))
    }
}

/// Crawl state over an in-memory SQLite store
pub(crate) fn memory_state() -> CrawlState {
    let store = SqliteStorage::new_in_memory().unwrap();
    CrawlState::new(Arc::new(store), 100)
}
