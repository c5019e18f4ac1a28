//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP transport and content-type gated fetching with retries
//! - HTML parsing (title and anchor extraction)
//! - Progress reporting
//! - Recursive crawl coordination

mod coordinator;
mod fetcher;
mod http;
mod parser;
mod progress;

#[cfg(test)]
mod testing;

pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{FetchResult, Fetcher, RetryPolicy};
pub use http::{build_http_client, HeadResponse, HttpTransport, ReqwestTransport, TransportError};
pub use parser::{HtmlParser, PageParser, ParsedPage};
pub use progress::{progress_message, ConsoleProgress, ProgressObserver, SilentProgress};
