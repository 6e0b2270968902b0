//! Per-job deduplication of frontier URLs

use crate::state::JobId;
use std::collections::{HashMap, HashSet};

/// Append-only record of the URLs enqueued for each job
///
/// Keys are `(job, url)` pairs; the same URL may be visited independently by
/// different jobs. Entries are only removed when the matching enqueue fails.
#[derive(Debug, Default)]
pub struct VisitedSet {
    by_job: HashMap<JobId, HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the key, returning true if it was not present before
    pub fn insert(&mut self, job_id: JobId, url: &str) -> bool {
        let urls = self.by_job.entry(job_id).or_default();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub fn contains(&self, job_id: JobId, url: &str) -> bool {
        self.by_job
            .get(&job_id)
            .map_or(false, |urls| urls.contains(url))
    }

    /// Forgets one key whose record never reached the frontier
    pub fn remove(&mut self, job_id: JobId, url: &str) -> bool {
        self.by_job
            .get_mut(&job_id)
            .map_or(false, |urls| urls.remove(url))
    }

    /// Forgets every URL recorded for a job
    pub fn remove_job(&mut self, job_id: JobId) {
        self.by_job.remove(&job_id);
    }

    /// Number of distinct URLs recorded for a job
    pub fn count_for(&self, job_id: JobId) -> usize {
        self.by_job.get(&job_id).map_or(0, HashSet::len)
    }

    /// Total number of keys across all jobs
    pub fn len(&self) -> usize {
        self.by_job.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
