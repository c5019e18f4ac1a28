//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{PageRecord, PageSummary};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Missing parent directories of `path` are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

#[async_trait]
impl RecordStore for SqliteStorage {
    async fn upsert_many(&self, records: &[PageRecord]) -> StorageResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO pages (url, title, html) VALUES (?1, ?2, ?3)
                 ON CONFLICT(url) DO UPDATE SET title = excluded.title, html = excluded.html",
            )?;

            for record in records {
                stmt.execute(params![record.url, record.title, record.html])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Upserted {} records", records.len());
        Ok(())
    }

    async fn read_by_domain(
        &self,
        domain_fragment: &str,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<PageSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT url, title FROM pages WHERE instr(url, ?1) > 0 LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt.query_map(
            params![domain_fragment, limit as i64, offset as i64],
            |row| {
                Ok(PageSummary {
                    url: row.get(0)?,
                    title: row.get(1)?,
                })
            },
        )?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row?);
        }

        Ok(pages)
    }

    async fn truncate(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM pages", [])?;
        tracing::debug!("Removed {} records", removed);
        Ok(())
    }

    async fn count(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
