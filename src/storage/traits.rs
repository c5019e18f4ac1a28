//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{PageRecord, PageSummary};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The crawl engine only ever calls `upsert_many`; the remaining operations
/// back the `get` and `truncate` commands. Implementations must be safe to
/// share across concurrently running traversal tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts or replaces records keyed by URL
    ///
    /// Idempotent: writing the same URL again overwrites its title and HTML
    /// (last write wins), including duplicates within one batch.
    async fn upsert_many(&self, records: &[PageRecord]) -> StorageResult<()>;

    /// Reads up to `limit` records whose URL contains `domain_fragment`
    ///
    /// Results come back in storage order, skipping the first `offset` matches.
    async fn read_by_domain(
        &self,
        domain_fragment: &str,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<PageSummary>>;

    /// Deletes every stored record
    async fn truncate(&self) -> StorageResult<()>;

    /// Counts stored records
    async fn count(&self) -> StorageResult<u64>;
}
