//! Crawler module for fetching, expanding and indexing pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with content-type checking
//! - HTML parsing, link extraction and anchor text collection
//! - Per-record page processing against the visited set
//! - Idle and absolute time limits for jobs
//! - The orchestrator loop and its submission/status surface

mod fetcher;
mod orchestrator;
mod parser;
mod processor;
mod termination;

pub use fetcher::{build_http_client, fetch_url, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use orchestrator::{IterationReport, Orchestrator};
pub use parser::{extract_links, parse_html, ParsedPage};
pub use processor::{PageProcessor, ProcessOutcome};
pub use termination::TerminationPolicy;

use crate::config::Config;
use crate::state::CrawlJob;
use crate::Result;

/// Crawls one site to completion
///
/// This is the one-shot entry point. It will:
/// 1. Open the configured SQLite storage and build the HTTP client
/// 2. Start the orchestrator loop
/// 3. Submit `base_url` and poll until the job finishes
/// 4. Stop the loop and return the final job snapshot
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `base_url` - Seed URL; only links starting with it are followed
pub async fn crawl_site(config: &Config, base_url: &str) -> Result<CrawlJob> {
    let orchestrator = Orchestrator::from_config(config)?;
    orchestrator.start().await?;

    let job = match orchestrator.submit_crawl(base_url) {
        Ok(job_id) => {
            orchestrator
                .wait_for_job(job_id, config.crawler.poll_interval())
                .await
        }
        Err(e) => Err(e),
    };

    orchestrator.stop().await;
    job
}
