//! Crawl job definitions
//!
//! A job is one breadth-first traversal of a site, identified by an opaque id
//! and moving once from `Running` to `Finished`.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle state of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Running,
    Finished,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a job stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishReason {
    /// The job is still running
    NotFinished,

    /// A record at the distance boundary was processed
    MaxDistance,

    /// The job exceeded its absolute time limit
    Timeout,

    /// No frontier activity for longer than the idle limit
    EmptyQueue,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFinished => "not_finished",
            Self::MaxDistance => "max_distance",
            Self::Timeout => "timeout",
            Self::EmptyQueue => "empty_queue",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One traversal of a site
///
/// Only the registry mutates a job. Values handed out by status queries are
/// snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlJob {
    pub id: JobId,

    /// Links must start with this prefix to be followed
    pub base_url: String,

    pub state: JobState,

    /// `NotFinished` exactly while `state` is `Running`
    pub finish_reason: FinishReason,

    pub start_time: DateTime<Utc>,

    /// Last time a frontier record for this job was observed or enqueued
    pub last_activity_time: DateTime<Utc>,

    /// Highest BFS depth reached so far
    pub max_distance_reached: u32,

    /// Pages fetched and handed to the index
    pub pages_indexed: u64,

    /// Pages dropped because the fetch failed
    pub pages_failed: u64,

    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlJob {
    /// Creates a running job started at `now`
    pub fn new(id: JobId, base_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            base_url: base_url.into(),
            state: JobState::Running,
            finish_reason: FinishReason::NotFinished,
            start_time: now,
            last_activity_time: now,
            max_distance_reached: 0,
            pages_indexed: 0,
            pages_failed: 0,
            finished_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    pub fn is_finished(&self) -> bool {
        self.state == JobState::Finished
    }

    /// Moves the job to `Finished`; returns false if it was already finished
    pub(crate) fn finish(&mut self, reason: FinishReason, now: DateTime<Utc>) -> bool {
        if self.is_finished() || reason == FinishReason::NotFinished {
            return false;
        }
        self.state = JobState::Finished;
        self.finish_reason = reason;
        self.finished_at = Some(now);
        true
    }
}
