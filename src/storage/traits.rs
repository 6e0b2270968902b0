//! Storage traits and error types
//!
//! This module defines the two collaborator interfaces the crawler writes to:
//! the frontier queue that carries crawl work, and the index sink that receives
//! page content.

use crate::state::JobId;
use crate::storage::{FrontierRecord, IndexDocument, SearchHit};
use thiserror::Error;

/// Errors that can occur in a queue or index backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Delivery channel for crawl-frontier records
///
/// Delivery is at-least-once: a record may be handed out again after a crash,
/// so consumers must tolerate seeing the same record twice.
pub trait FrontierQueue: Send + Sync {
    /// Appends a record to the back of the queue
    fn enqueue(&self, record: FrontierRecord) -> StorageResult<()>;

    /// Removes and returns the next batch of records, oldest first
    ///
    /// The batch size is chosen by the queue. Never blocks; an empty vector
    /// means there is currently no work.
    fn dequeue_batch(&self) -> StorageResult<Vec<FrontierRecord>>;

    /// Number of records waiting
    fn pending(&self) -> StorageResult<usize>;
}

/// Append-only destination for indexed pages
pub trait IndexSink: Send + Sync {
    /// Stores one indexed page
    ///
    /// Writing the same page twice is allowed and produces two entries.
    fn write(&self, document: &IndexDocument) -> StorageResult<()>;

    /// Finds a job's pages whose text contains `query`, best matches first
    fn search(&self, job_id: JobId, query: &str, limit: usize) -> StorageResult<Vec<SearchHit>>;
}
