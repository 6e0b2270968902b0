//! In-process frontier queue and index
//!
//! Used when the crawler is embedded without a database, and throughout the
//! test suite.

use crate::state::JobId;
use crate::storage::traits::{FrontierQueue, IndexSink, StorageResult};
use crate::storage::{rank_hits, score_text, FrontierRecord, IndexDocument, SearchHit};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// FIFO frontier held in memory
#[derive(Debug)]
pub struct MemoryFrontier {
    records: Mutex<VecDeque<FrontierRecord>>,
    batch_size: usize,
}

impl MemoryFrontier {
    pub fn new(batch_size: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            batch_size: batch_size.max(1),
        }
    }

    /// Copies of the waiting records, front first
    pub fn snapshot(&self) -> Vec<FrontierRecord> {
        lock(&self.records).iter().cloned().collect()
    }
}

impl FrontierQueue for MemoryFrontier {
    fn enqueue(&self, record: FrontierRecord) -> StorageResult<()> {
        lock(&self.records).push_back(record);
        Ok(())
    }

    fn dequeue_batch(&self) -> StorageResult<Vec<FrontierRecord>> {
        let mut records = lock(&self.records);
        let take = records.len().min(self.batch_size);
        Ok(records.drain(..take).collect())
    }

    fn pending(&self) -> StorageResult<usize> {
        Ok(lock(&self.records).len())
    }
}

/// Append-only index held in memory
#[derive(Debug, Default)]
pub struct MemoryIndex {
    documents: Mutex<Vec<IndexDocument>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every document written so far, in write order
    pub fn documents(&self) -> Vec<IndexDocument> {
        lock(&self.documents).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IndexSink for MemoryIndex {
    fn write(&self, document: &IndexDocument) -> StorageResult<()> {
        lock(&self.documents).push(document.clone());
        Ok(())
    }

    fn search(&self, job_id: JobId, query: &str, limit: usize) -> StorageResult<Vec<SearchHit>> {
        let list_all = query.trim().is_empty();
        let hits = lock(&self.documents)
            .iter()
            .filter(|document| document.job_id == job_id)
            .map(|document| SearchHit {
                score: score_text(&document.text, query),
                document: document.clone(),
            })
            .filter(|hit| list_all || hit.score > 0)
            .collect();
        Ok(rank_hits(hits, limit))
    }
}
