//! Time-based termination of crawl jobs
//!
//! The distance bound is enforced inline by the page processor; this module
//! covers the two clock-driven bounds, checked once per loop iteration.

use crate::config::CrawlerConfig;
use crate::state::{CrawlJob, FinishReason, JobId, JobRegistry};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Idle and absolute time limits applied to every running job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationPolicy {
    idle_timeout: Duration,
    max_duration: Duration,
}

impl TerminationPolicy {
    pub fn new(idle_timeout: Duration, max_duration: Duration) -> Self {
        Self {
            idle_timeout,
            max_duration,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.idle_timeout(), config.max_job_duration())
    }

    /// Returns the bound a running job has crossed at `now`, if any
    ///
    /// Idleness is checked before the absolute limit.
    pub fn check(&self, job: &CrawlJob, now: DateTime<Utc>) -> Option<FinishReason> {
        if !job.is_running() {
            return None;
        }
        if elapsed(job.last_activity_time, now) > self.idle_timeout {
            return Some(FinishReason::EmptyQueue);
        }
        if elapsed(job.start_time, now) > self.max_duration {
            return Some(FinishReason::Timeout);
        }
        None
    }

    /// Finishes every running job that crossed a bound
    ///
    /// Returns the jobs finished by this pass.
    pub fn evaluate(
        &self,
        registry: &mut JobRegistry,
        now: DateTime<Utc>,
    ) -> Vec<(JobId, FinishReason)> {
        let expired: Vec<(JobId, FinishReason)> = registry
            .running()
            .filter_map(|job| self.check(job, now).map(|reason| (job.id, reason)))
            .collect();

        expired
            .into_iter()
            .filter(|(id, reason)| registry.finish(*id, *reason, now))
            .inspect(|(id, reason)| tracing::info!("Job {} finished: {}", id, reason))
            .collect()
    }
}

/// Time from `since` to `now`; a clock that went backwards counts as zero
fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}
