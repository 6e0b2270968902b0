//! Page processor
//!
//! Turns one frontier record into at most one fetch, zero or more new frontier
//! records, and one index write.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::parse_html;
use crate::state::{lock_state, FinishReason, SharedState};
use crate::storage::{FrontierQueue, FrontierRecord, IndexDocument, IndexSink};
use crate::url::filter_within_base;
use crate::IndexerError;
use chrono::Utc;
use std::sync::Arc;
use url::Url;

/// What happened to a single frontier record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The page was fetched and indexed; `enqueued` new records were emitted
    Indexed { enqueued: usize },

    /// The job is finished or unknown; nothing was done
    Discarded,

    /// The record sat on the distance boundary and finished its job
    DistanceLimit,

    /// The fetch failed; the record was dropped
    FetchFailed,
}

/// Fetches, expands and indexes frontier records
pub struct PageProcessor {
    state: SharedState,
    queue: Arc<dyn FrontierQueue>,
    fetcher: Arc<dyn Fetcher>,
    index: Arc<dyn IndexSink>,
    max_distance: u32,
}

impl PageProcessor {
    pub fn new(
        state: SharedState,
        queue: Arc<dyn FrontierQueue>,
        fetcher: Arc<dyn Fetcher>,
        index: Arc<dyn IndexSink>,
        max_distance: u32,
    ) -> Self {
        Self {
            state,
            queue,
            fetcher,
            index,
            max_distance,
        }
    }

    /// Processes one frontier record
    ///
    /// Fetch failures are absorbed and reported as `FetchFailed`. An error is
    /// returned only when the frontier queue or the index sink fails.
    pub async fn process(&self, record: &FrontierRecord) -> Result<ProcessOutcome, IndexerError> {
        let job_id = record.job_id;
        let next_distance = record.distance.saturating_add(1);

        let base_url = {
            let mut state = lock_state(&self.state);
            let now = Utc::now();

            let base_url = match state.registry.get(job_id) {
                Some(job) if job.is_running() => job.base_url.clone(),
                Some(_) => {
                    tracing::debug!("Discarding {} for finished job {}", record.url, job_id);
                    return Ok(ProcessOutcome::Discarded);
                }
                None => {
                    tracing::warn!("Discarding {} for unknown job {}", record.url, job_id);
                    return Ok(ProcessOutcome::Discarded);
                }
            };

            state.registry.touch(job_id, now);
            state.registry.record_distance(job_id, record.distance);

            if next_distance >= self.max_distance {
                if state
                    .registry
                    .finish(job_id, FinishReason::MaxDistance, now)
                {
                    tracing::info!(
                        "Job {} finished: reached distance limit at {}",
                        job_id,
                        record.url
                    );
                }
                return Ok(ProcessOutcome::DistanceLimit);
            }

            base_url
        };

        tracing::debug!("Fetching {} (job {}, distance {})", record.url, job_id, record.distance);
        let page = match self.fetcher.fetch(&record.url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Dropping {}: {}", record.url, e);
                lock_state(&self.state).registry.record_failed(job_id);
                return Ok(ProcessOutcome::FetchFailed);
            }
        };

        let page_url = match Url::parse(&page.final_url).or_else(|_| Url::parse(&record.url)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Dropping {}: unusable page URL: {}", record.url, e);
                lock_state(&self.state).registry.record_failed(job_id);
                return Ok(ProcessOutcome::FetchFailed);
            }
        };

        let parsed = parse_html(&page.body, &page_url);
        let same_site = filter_within_base(&parsed.links, &base_url);
        tracing::debug!(
            "Extracted {} links from {} ({} on site)",
            parsed.links.len(),
            record.url,
            same_site.len()
        );

        // Each key enters the visited set just before its enqueue and leaves it
        // again if the enqueue fails, so a redelivered record can retry it.
        let mut enqueued = 0;
        for link in same_site {
            {
                let mut state = lock_state(&self.state);
                let still_running = state
                    .registry
                    .get(job_id)
                    .map_or(false, |job| job.is_running());
                if !still_running {
                    break;
                }
                if !state.visited.insert(job_id, &link) {
                    continue;
                }
            }

            if let Err(e) = self
                .queue
                .enqueue(FrontierRecord::new(job_id, link.clone(), next_distance))
            {
                lock_state(&self.state).visited.remove(job_id, &link);
                return Err(e.into());
            }
            enqueued += 1;

            let mut state = lock_state(&self.state);
            state.registry.record_distance(job_id, next_distance);
            state.registry.touch(job_id, Utc::now());
        }
        if enqueued > 0 {
            tracing::debug!(
                "Enqueued {} links at distance {} for job {}",
                enqueued,
                next_distance,
                job_id
            );
        }

        let document = IndexDocument {
            job_id,
            source_url: record.url.clone(),
            base_url,
            text: parsed.anchor_text,
            distance: next_distance,
        };
        self.index.write(&document)?;
        lock_state(&self.state).registry.record_indexed(job_id);

        Ok(ProcessOutcome::Indexed { enqueued })
    }
}
