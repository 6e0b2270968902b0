//! SQLite storage implementation
//!
//! This module provides a SQLite-backed frontier queue and index sink sharing
//! one database file.

use crate::state::JobId;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{FrontierQueue, IndexSink, StorageError, StorageResult};
use crate::storage::{rank_hits, score_text, FrontierRecord, IndexDocument, SearchHit};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    batch_size: usize,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `batch_size` - Maximum number of records one dequeue returns
    pub fn new(path: &Path, batch_size: usize) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

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
            batch_size: batch_size.max(1),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(batch_size: usize) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            batch_size: batch_size.max(1),
        })
    }

    fn connection(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }

    /// Counts indexed documents for a job
    pub fn count_documents(&self, job_id: JobId) -> StorageResult<u64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE job_id = ?1",
            params![job_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl FrontierQueue for SqliteStorage {
    fn enqueue(&self, record: FrontierRecord) -> StorageResult<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO frontier (job_id, url, distance, enqueued_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                record.job_id.to_string(),
                record.url,
                record.distance,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn dequeue_batch(&self) -> StorageResult<Vec<FrontierRecord>> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        let rows = {
            let mut stmt = tx.prepare(
                "SELECT id, job_id, url, distance FROM frontier ORDER BY id ASC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![self.batch_size as i64], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u32>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        if let Some((last_id, ..)) = rows.last() {
            tx.execute("DELETE FROM frontier WHERE id <= ?1", params![last_id])?;
        }
        tx.commit()?;

        // Rows that cannot be decoded are dropped with the batch; keeping them
        // would stall the head of the queue forever.
        let records = rows
            .into_iter()
            .filter_map(|(id, job_id, url, distance)| match job_id.parse::<JobId>() {
                Ok(job_id) => Some(FrontierRecord::new(job_id, url, distance)),
                Err(e) => {
                    tracing::warn!("Dropping frontier row {} with bad job id: {}", id, e);
                    None
                }
            })
            .collect();

        Ok(records)
    }

    fn pending(&self) -> StorageResult<usize> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM frontier", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl IndexSink for SqliteStorage {
    fn write(&self, document: &IndexDocument) -> StorageResult<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO documents (job_id, source_url, base_url, text, distance, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                document.job_id.to_string(),
                document.source_url,
                document.base_url,
                document.text,
                document.distance,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Matching happens in Rust rather than with SQLite's `lower()`, which only
    /// folds ASCII, so both index backends agree on non-ASCII text.
    fn search(&self, job_id: JobId, query: &str, limit: usize) -> StorageResult<Vec<SearchHit>> {
        let list_all = query.trim().is_empty();
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT source_url, base_url, text, distance FROM documents WHERE job_id = ?1",
        )?;

        let documents = stmt
            .query_map(params![job_id.to_string()], |row| {
                Ok(IndexDocument {
                    job_id,
                    source_url: row.get(0)?,
                    base_url: row.get(1)?,
                    text: row.get(2)?,
                    distance: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let hits = documents
            .into_iter()
            .map(|document| SearchHit {
                score: score_text(&document.text, query),
                document,
            })
            .filter(|hit| list_all || hit.score > 0)
            .collect();

        Ok(rank_hits(hits, limit))
    }
}
