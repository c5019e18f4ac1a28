//! Storage module for persisting crawled pages
//!
//! This module handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - Batched, idempotent upserts keyed by URL
//! - Paginated reads filtered by a domain fragment

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::SpiderError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SpiderError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SpiderError> {
    Ok(SqliteStorage::new(path)?)
}

/// A scraped page awaiting (or after) write-back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub html: String,
}

impl PageRecord {
    pub fn new(url: impl Into<String>, title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            html: html.into(),
        }
    }
}

/// The `(url, title)` projection returned by domain lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
}
