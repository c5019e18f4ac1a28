//! Shared per-crawl state
//!
//! One `CrawlState` is created per crawl and shared (behind an `Arc`) by every
//! traversal task. Each structure sits behind its own lock; none of the locks
//! is ever held across an `.await`.

use crate::state::stats::{CrawlStats, Outcome};
use crate::storage::{PageRecord, RecordStore, StorageResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Visited and pending URLs, guarded together so that claim and
/// mark-pending are single check-and-insert steps.
#[derive(Debug, Default)]
struct UrlSets {
    /// URLs whose fetch has been attempted (success or failure)
    visited: HashSet<String>,
    /// URLs scheduled for traversal but not yet claimed
    pending: HashSet<String>,
}

/// Mutable state shared by all traversal tasks of one crawl
pub struct CrawlState {
    urls: Mutex<UrlSets>,
    buffer: Mutex<Vec<PageRecord>>,
    flush_threshold: usize,
    store: Arc<dyn RecordStore>,
    total: AtomicUsize,
    done: AtomicUsize,
    stats: Mutex<CrawlStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Every critical section is a plain in-memory update, so a panic in one
    // cannot leave the data half-written.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CrawlState {
    /// Creates fresh state for one crawl
    ///
    /// The task counter starts at 1 to account for the seed.
    pub fn new(store: Arc<dyn RecordStore>, flush_threshold: usize) -> Self {
        Self {
            urls: Mutex::new(UrlSets::default()),
            buffer: Mutex::new(Vec::new()),
            flush_threshold: flush_threshold.max(1),
            store,
            total: AtomicUsize::new(1),
            done: AtomicUsize::new(0),
            stats: Mutex::new(CrawlStats::new()),
        }
    }

    // ===== URL Sets =====

    /// Claims a URL for fetching
    ///
    /// Returns `false` if the URL was already visited. Otherwise moves it from
    /// pending to visited and returns `true`. This is the only gate against
    /// fetching the same URL twice.
    pub fn claim(&self, url: &str) -> bool {
        let mut urls = lock(&self.urls);
        if urls.visited.contains(url) {
            return false;
        }

        urls.visited.insert(url.to_string());
        urls.pending.remove(url);
        true
    }

    /// Marks a discovered link as scheduled
    ///
    /// Returns `false` if the URL is already visited or already pending, so
    /// only one traversal task is ever launched per distinct link.
    pub fn mark_pending(&self, url: &str) -> bool {
        let mut urls = lock(&self.urls);
        if urls.visited.contains(url) || urls.pending.contains(url) {
            return false;
        }

        urls.pending.insert(url.to_string());
        true
    }

    pub fn visited_count(&self) -> usize {
        lock(&self.urls).visited.len()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.urls).pending.len()
    }

    // ===== Record Buffer =====

    /// Buffers a record, writing the buffer out once it reaches the threshold
    ///
    /// The length check and the swap happen under one lock, so concurrent
    /// appends can neither be lost nor written twice.
    pub async fn append(&self, record: PageRecord) -> StorageResult<()> {
        let batch = {
            let mut buffer = lock(&self.buffer);
            buffer.push(record);
            if buffer.len() >= self.flush_threshold {
                Some(std::mem::take(&mut *buffer))
            } else {
                None
            }
        };

        match batch {
            Some(batch) => self.write_batch(batch).await,
            None => Ok(()),
        }
    }

    /// Writes out whatever is buffered
    pub async fn flush(&self) -> StorageResult<()> {
        let batch = std::mem::take(&mut *lock(&self.buffer));
        if batch.is_empty() {
            return Ok(());
        }

        self.write_batch(batch).await
    }

    /// Hands a batch to the store; on failure the batch goes back to the
    /// front of the buffer so a later flush can retry it.
    async fn write_batch(&self, batch: Vec<PageRecord>) -> StorageResult<()> {
        let size = batch.len();
        match self.store.upsert_many(&batch).await {
            Ok(()) => {
                tracing::info!("Flushed {} records", size);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to flush {} records: {}", size, e);
                let mut buffer = lock(&self.buffer);
                let newer = std::mem::replace(&mut *buffer, batch);
                buffer.extend(newer);
                Err(e)
            }
        }
    }

    pub fn buffered_len(&self) -> usize {
        lock(&self.buffer).len()
    }

    // ===== Statistics =====

    pub fn record_outcome(&self, outcome: Outcome) {
        lock(&self.stats).record(&outcome);
    }

    /// Snapshot of the statistics collected so far
    pub fn stats(&self) -> CrawlStats {
        lock(&self.stats).clone()
    }

    // ===== Progress Counters =====

    /// Accounts for a newly launched child task
    pub fn schedule_child(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    /// Accounts for a finished task and returns `(done, total)` afterwards
    pub fn complete_task(&self) -> (usize, usize) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        (done, self.total.load(Ordering::SeqCst))
    }

    /// Current `(done, total)`
    pub fn progress(&self) -> (usize, usize) {
        (
            self.done.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }
}
