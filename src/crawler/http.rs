//! HTTP transport used by the fetcher
//!
//! The fetcher only needs two operations, a HEAD (for the `Content-Type`
//! header) and a GET decoded as text. They sit behind `HttpTransport` so the
//! retry logic can be driven by a scripted transport in tests.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Failure kinds reported by a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Connection errors and timeouts may succeed on retry; decode errors won't
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}

/// The parts of a HEAD response the fetcher looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResponse {
    pub status: u16,
    pub content_type: Option<String>,
}

impl HeadResponse {
    pub fn new(status: u16, content_type: Option<&str>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
        }
    }
}

/// Minimal HTTP client interface
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a HEAD request bounded by `timeout`
    async fn head(&self, url: &str, timeout: Duration) -> Result<HeadResponse, TransportError>;

    /// Sends a GET request bounded by `timeout` and decodes the body in the
    /// charset its `Content-Type` declares (UTF-8 when none is declared)
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed by reqwest's default policy.
///
/// # Example
///
/// ```no_run
/// use spider::config::UserAgentConfig;
/// use spider::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .gzip(true)
        .brotli(true)
        .build()
}

/// `HttpTransport` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

/// Maps a reqwest failure onto the transport's failure kinds
fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(error.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn head(&self, url: &str, timeout: Duration) -> Result<HeadResponse, TransportError> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(HeadResponse {
            status: response.status().as_u16(),
            content_type,
        })
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(classify)?;

        decode_body(&body, content_type.as_deref())
    }
}

/// The `charset` parameter of a `Content-Type` value, if any
fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Decodes `bytes` strictly in the declared charset
///
/// Unknown labels fall back to UTF-8. A byte sequence that is malformed in the
/// chosen encoding is a `TransportError::Decode`, never replacement characters.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, TransportError> {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            TransportError::Decode(format!("body is not valid {}", encoding.name()))
        })
}
