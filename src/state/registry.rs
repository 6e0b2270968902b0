//! Job registry: the mapping from job id to job state

use crate::state::{CrawlJob, FinishReason, JobId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Mapping from job id to job state
///
/// Finished jobs are kept so their final status stays queryable.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<JobId, CrawlJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a running job for `base_url` and returns its id
    pub fn register(&mut self, base_url: &str, now: DateTime<Utc>) -> JobId {
        let id = JobId::new();
        self.jobs.insert(id, CrawlJob::new(id, base_url, now));
        id
    }

    /// Drops a job entirely; used to roll back a submission whose seed never
    /// reached the frontier
    pub fn remove(&mut self, id: JobId) -> Option<CrawlJob> {
        self.jobs.remove(&id)
    }

    pub fn get(&self, id: JobId) -> Option<&CrawlJob> {
        self.jobs.get(&id)
    }

    /// Returns a copy of the job for callers outside the lock
    pub fn snapshot(&self, id: JobId) -> Option<CrawlJob> {
        self.jobs.get(&id).cloned()
    }

    /// Returns copies of every job, oldest first
    pub fn snapshot_all(&self) -> Vec<CrawlJob> {
        let mut jobs: Vec<CrawlJob> = self.jobs.values().cloned().collect();
        jobs.sort_by_key(|job| job.start_time);
        jobs
    }

    /// Records frontier activity for a running job
    pub fn touch(&mut self, id: JobId, now: DateTime<Utc>) -> bool {
        match self.jobs.get_mut(&id) {
            Some(job) if job.is_running() => {
                job.last_activity_time = now;
                true
            }
            _ => false,
        }
    }

    /// Finishes a job; a job that is already finished keeps its first reason
    ///
    /// Returns true only when this call performed the transition.
    pub fn finish(&mut self, id: JobId, reason: FinishReason, now: DateTime<Utc>) -> bool {
        self.jobs
            .get_mut(&id)
            .map_or(false, |job| job.finish(reason, now))
    }

    pub fn record_distance(&mut self, id: JobId, distance: u32) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.max_distance_reached = job.max_distance_reached.max(distance);
        }
    }

    pub fn record_indexed(&mut self, id: JobId) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.pages_indexed += 1;
        }
    }

    pub fn record_failed(&mut self, id: JobId) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.pages_failed += 1;
        }
    }

    pub fn running(&self) -> impl Iterator<Item = &CrawlJob> {
        self.jobs.values().filter(|job| job.is_running())
    }

    pub fn running_count(&self) -> usize {
        self.running().count()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
