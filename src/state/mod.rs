//! State module for tracking crawl jobs
//!
//! This module holds everything the orchestrator owns exclusively.
//!
//! # Components
//!
//! - `CrawlJob`: one traversal and its `Running -> Finished` state machine
//! - `JobRegistry`: job id to job mapping
//! - `VisitedSet`: `(job, url)` deduplication index
//! - `CrawlState`: registry and visited set behind the single shared lock

mod job;
mod registry;
mod visited;

// Re-export main types
pub use job::{CrawlJob, FinishReason, JobId, JobState};
pub use registry::JobRegistry;
pub use visited::VisitedSet;

use std::sync::{Arc, Mutex, MutexGuard};

/// Registry and visited set, guarded together
///
/// Dedup decisions and job-state checks for a record happen under the same
/// lock acquisition, so a link is never enqueued for a job that was finished
/// concurrently.
#[derive(Debug, Default)]
pub struct CrawlState {
    pub registry: JobRegistry,
    pub visited: VisitedSet,
}

/// Handle shared by the orchestrator worker and status callers
pub type SharedState = Arc<Mutex<CrawlState>>;

/// Creates an empty shared state
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(CrawlState::default()))
}

/// Locks the shared state
///
/// Registry mutations never call out to collaborators while holding the lock,
/// so a poisoned lock is recovered rather than propagated.
pub fn lock_state(state: &Mutex<CrawlState>) -> MutexGuard<'_, CrawlState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
