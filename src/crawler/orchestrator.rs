//! Crawl orchestrator
//!
//! Owns the job registry and visited set, drives the control loop on a
//! background tokio task, and exposes the submission and status surface.
//!
//! Each loop iteration drains one batch from the frontier queue, hands every
//! record to the page processor in order, then applies the termination
//! policy. An empty batch is not a reason to exit: the loop sleeps for the
//! poll interval and polls again until it is stopped or reaches its run
//! ceiling.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::processor::{PageProcessor, ProcessOutcome};
use crate::crawler::termination::TerminationPolicy;
use crate::state::{lock_state, new_shared_state, CrawlJob, FinishReason, JobId, SharedState};
use crate::storage::{open_storage, FrontierQueue, FrontierRecord, IndexSink, SearchHit};
use crate::url::parse_base_url;
use crate::{IndexerError, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Upper bound for the pause after failing iterations
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Lower bound for the pause after a failing iteration
const MIN_BACKOFF: Duration = Duration::from_millis(100);

/// Counts from a single loop iteration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    /// Records drained from the frontier queue
    pub received: usize,

    /// Records whose page was fetched and indexed
    pub indexed: usize,

    /// New frontier records emitted while indexing
    pub enqueued: usize,

    /// Records belonging to finished or unknown jobs
    pub discarded: usize,

    /// Records that finished their job on the distance bound
    pub distance_limited: usize,

    /// Records dropped because the fetch failed
    pub fetch_failed: usize,

    /// Records abandoned because the queue or the index rejected a write
    pub sink_errors: usize,

    /// Jobs finished by the termination policy at the end of the iteration
    pub finished: Vec<(JobId, FinishReason)>,
}

impl IterationReport {
    fn record(&mut self, outcome: ProcessOutcome) {
        match outcome {
            ProcessOutcome::Indexed { enqueued } => {
                self.indexed += 1;
                self.enqueued += enqueued;
            }
            ProcessOutcome::Discarded => self.discarded += 1,
            ProcessOutcome::DistanceLimit => self.distance_limited += 1,
            ProcessOutcome::FetchFailed => self.fetch_failed += 1,
        }
    }
}

/// Everything the background task needs, shared with the public handle
struct CrawlWorker {
    config: CrawlerConfig,
    state: SharedState,
    queue: Arc<dyn FrontierQueue>,
    index: Arc<dyn IndexSink>,
    processor: PageProcessor,
    policy: TerminationPolicy,
}

impl CrawlWorker {
    async fn run_once(&self) -> Result<IterationReport> {
        let mut report = IterationReport::default();

        let batch = match self.queue.dequeue_batch() {
            Ok(batch) => batch,
            Err(e) => {
                // Timers keep running even when the queue is down
                report.finished = self.apply_policy();
                return Err(e.into());
            }
        };
        report.received = batch.len();

        for record in &batch {
            match self.processor.process(record).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    tracing::error!(
                        "Abandoning {} for job {}: {}",
                        record.url,
                        record.job_id,
                        e
                    );
                    report.sink_errors += 1;
                }
            }
        }

        report.finished = self.apply_policy();
        Ok(report)
    }

    fn apply_policy(&self) -> Vec<(JobId, FinishReason)> {
        let mut state = lock_state(&self.state);
        self.policy.evaluate(&mut state.registry, Utc::now())
    }
}

/// Pause before the next poll after `failures` consecutive failing iterations
fn backoff(poll_interval: Duration, failures: u32) -> Duration {
    let factor = 1u32 << failures.min(16);
    poll_interval
        .max(MIN_BACKOFF)
        .saturating_mul(factor)
        .min(MAX_BACKOFF)
}

async fn run_loop(
    worker: Arc<CrawlWorker>,
    running: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let poll_interval = worker.config.poll_interval();
    // A ceiling too far out to represent means no ceiling
    let deadline = Instant::now().checked_add(worker.config.max_run_time());
    let mut failures: u32 = 0;
    let mut iterations: u64 = 0;

    loop {
        if *shutdown.borrow() {
            tracing::info!("Crawl loop stopping on request");
            break;
        }
        if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            tracing::warn!(
                "Crawl loop reached its run ceiling of {:?}",
                worker.config.max_run_time()
            );
            break;
        }

        iterations += 1;
        let pause = match worker.run_once().await {
            Ok(report) => {
                if report.received > 0 {
                    tracing::debug!(
                        "Iteration {}: {} records, {} indexed, {} enqueued, {} failed",
                        iterations,
                        report.received,
                        report.indexed,
                        report.enqueued,
                        report.fetch_failed
                    );
                }
                if report.sink_errors > 0 {
                    failures += 1;
                    backoff(poll_interval, failures)
                } else {
                    failures = 0;
                    if report.received == 0 {
                        poll_interval
                    } else {
                        Duration::ZERO
                    }
                }
            }
            Err(e) => {
                failures += 1;
                let pause = backoff(poll_interval, failures);
                tracing::error!("Crawl iteration failed: {} (retrying in {:?})", e, pause);
                pause
            }
        };

        if pause.is_zero() {
            tokio::task::yield_now().await;
            continue;
        }

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            changed = shutdown.changed() => {
                // The handle was dropped without calling stop()
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    tracing::info!("Crawl loop exited after {} iterations", iterations);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Crawl orchestrator
///
/// Accepts crawl submissions at any time; pages are only processed while the
/// background loop is running (see [`Orchestrator::start`]) or when
/// [`Orchestrator::run_once`] is driven by hand.
pub struct Orchestrator {
    worker: Arc<CrawlWorker>,
    running: Arc<AtomicBool>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Creates an orchestrator over the given collaborators
    pub fn new(
        config: CrawlerConfig,
        queue: Arc<dyn FrontierQueue>,
        fetcher: Arc<dyn Fetcher>,
        index: Arc<dyn IndexSink>,
    ) -> Self {
        let state = new_shared_state();
        let processor = PageProcessor::new(
            state.clone(),
            queue.clone(),
            fetcher,
            index.clone(),
            config.max_distance,
        );
        let policy = TerminationPolicy::from_config(&config);

        Self {
            worker: Arc::new(CrawlWorker {
                config,
                state,
                queue,
                index,
                processor,
                policy,
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Creates an orchestrator backed by SQLite storage and an HTTP fetcher
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = Arc::new(open_storage(
            Path::new(&config.storage.database_path),
            config.crawler.batch_size,
        )?);
        let fetcher = Arc::new(HttpFetcher::from_config(&config.user_agent)?);

        Ok(Self::new(
            config.crawler.clone(),
            storage.clone(),
            fetcher,
            storage,
        ))
    }

    /// Registers a crawl of `base_url` and queues its seed page
    ///
    /// Returns as soon as the seed is queued; progress is visible through
    /// [`Orchestrator::get_crawl_status`].
    ///
    /// # Errors
    ///
    /// * `UrlError` - `base_url` is not an absolute http(s) URL
    /// * `Storage` - the seed could not be queued; no job is created
    pub fn submit_crawl(&self, base_url: &str) -> Result<JobId> {
        let base_url = parse_base_url(base_url)?;

        let job_id = {
            let mut state = lock_state(&self.worker.state);
            let id = state.registry.register(&base_url, Utc::now());
            state.visited.insert(id, &base_url);
            id
        };

        if let Err(e) = self
            .worker
            .queue
            .enqueue(FrontierRecord::seed(job_id, base_url.clone()))
        {
            let mut state = lock_state(&self.worker.state);
            state.registry.remove(job_id);
            state.visited.remove_job(job_id);
            tracing::error!("Failed to queue seed {}: {}", base_url, e);
            return Err(e.into());
        }

        tracing::info!("Submitted crawl job {} for {}", job_id, base_url);
        Ok(job_id)
    }

    /// Returns a snapshot of a job
    pub fn get_crawl_status(&self, job_id: JobId) -> Result<CrawlJob> {
        lock_state(&self.worker.state)
            .registry
            .snapshot(job_id)
            .ok_or(IndexerError::JobNotFound(job_id))
    }

    /// Returns snapshots of every known job, oldest first
    pub fn list_jobs(&self) -> Vec<CrawlJob> {
        lock_state(&self.worker.state).registry.snapshot_all()
    }

    /// Searches the pages indexed for a job
    pub fn search_index(&self, job_id: JobId, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        Ok(self.worker.index.search(job_id, query, limit)?)
    }

    /// Runs a single loop iteration on the calling task
    ///
    /// Meant for embedding and tests; do not mix with a running background
    /// loop.
    pub async fn run_once(&self) -> Result<IterationReport> {
        self.worker.run_once().await
    }

    /// Spawns the background loop
    ///
    /// # Errors
    ///
    /// * `AlreadyRunning` - the loop is already running
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Orchestrator already running");
            return Err(IndexerError::AlreadyRunning);
        }

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(self.worker.clone(), self.running.clone(), rx));

        *lock(&self.shutdown) = Some(tx);
        // A previous loop that hit its ceiling has already exited
        *lock(&self.handle) = Some(task);

        tracing::info!(
            "Orchestrator started (max distance {}, idle timeout {:?}, job limit {:?})",
            self.worker.config.max_distance,
            self.worker.config.idle_timeout(),
            self.worker.config.max_job_duration()
        );
        Ok(())
    }

    /// Signals the background loop and waits for its current iteration to end
    ///
    /// Stopping an orchestrator that is not running is a no-op.
    pub async fn stop(&self) {
        let sender = lock(&self.shutdown).take();
        let task = lock(&self.handle).take();

        let Some(task) = task else {
            tracing::debug!("Orchestrator not running");
            return;
        };

        if let Some(sender) = sender {
            let _ = sender.send(true);
        }
        if let Err(e) = task.await {
            tracing::error!("Crawl loop task failed: {}", e);
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Orchestrator stopped");
    }

    /// Returns true while the background loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Polls a job until it finishes or the background loop exits
    ///
    /// Returns the last snapshot seen.
    pub async fn wait_for_job(&self, job_id: JobId, poll: Duration) -> Result<CrawlJob> {
        loop {
            let job = self.get_crawl_status(job_id)?;
            if job.is_finished() || !self.is_running() {
                return Ok(job);
            }
            tokio::time::sleep(poll).await;
        }
    }
}
