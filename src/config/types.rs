use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Spider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub database: DatabaseConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Attempts per request kind (HEAD, then GET) before giving up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Pause between failed attempts (milliseconds)
    #[serde(rename = "sleep-time-ms")]
    pub sleep_time_ms: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Number of buffered records that triggers a write to the database
    #[serde(rename = "flush-threshold")]
    pub flush_threshold: usize,

    /// Optional cap on fetches in flight at once; unbounded when absent
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: Option<usize>,
}

impl CrawlerConfig {
    pub fn sleep_time(&self) -> Duration {
        Duration::from_millis(self.sleep_time_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            sleep_time_ms: 500,
            timeout_ms: 3000,
            flush_threshold: 100,
            max_concurrent_fetches: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value: `Name/Version`
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "spider".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "spider.db".to_string(),
        }
    }
}
