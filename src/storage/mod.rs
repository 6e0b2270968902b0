//! Storage module for crawl work and indexed content
//!
//! This module handles the crawler's two external collaborators:
//! - The frontier queue that carries crawl work between iterations
//! - The index sink that receives extracted page content and answers searches
//!
//! Both have an in-memory implementation for embedded use and tests, and a
//! SQLite implementation that survives restarts.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::{MemoryFrontier, MemoryIndex};
pub use sqlite::SqliteStorage;
pub use traits::{FrontierQueue, IndexSink, StorageError, StorageResult};

use crate::state::JobId;
use std::path::Path;

/// Opens (or creates) the SQLite database backing the frontier and the index
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
/// * `batch_size` - Maximum records returned by one dequeue
pub fn open_storage(path: &Path, batch_size: usize) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path, batch_size)
}

/// One unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierRecord {
    pub job_id: JobId,

    /// Absolute URL to fetch
    pub url: String,

    /// Link hops from the job's seed URL
    pub distance: u32,
}

impl FrontierRecord {
    pub fn new(job_id: JobId, url: impl Into<String>, distance: u32) -> Self {
        Self {
            job_id,
            url: url.into(),
            distance,
        }
    }

    /// The seed record for a new job
    pub fn seed(job_id: JobId, base_url: impl Into<String>) -> Self {
        Self::new(job_id, base_url, 0)
    }
}

/// One page as written to the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub job_id: JobId,

    /// The page the text came from
    pub source_url: String,

    /// The job's base URL
    pub base_url: String,

    /// Anchor text extracted from the page
    pub text: String,

    pub distance: u32,
}

/// A search result with its relevance score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub document: IndexDocument,

    /// Case-insensitive occurrences of the query in the document text
    pub score: usize,
}

/// Counts case-insensitive, non-overlapping occurrences of `query` in `text`
///
/// An empty query scores zero against everything.
pub(crate) fn score_text(text: &str, query: &str) -> usize {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(query.as_str()).count()
}

/// Orders hits by score (descending), then by distance and URL
pub(crate) fn rank_hits(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.document.distance.cmp(&b.document.distance))
            .then_with(|| a.document.source_url.cmp(&b.document.source_url))
    });
    hits.truncate(limit);
    hits
}
