//! Site-Indexer main entry point
//!
//! This is the command-line interface for the Site-Indexer crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use site_indexer::config::{load_config_with_hash, Config};
use site_indexer::storage::{open_storage, IndexSink};
use site_indexer::{CrawlJob, JobId, Orchestrator};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Indexer: a same-site crawler feeding a search index
///
/// Site-Indexer walks the pages under a base URL breadth-first, indexes the
/// anchor text of every page it fetches, and stops each crawl on a distance,
/// idle, or time bound.
#[derive(Parser, Debug)]
#[command(name = "site-indexer")]
#[command(version)]
#[command(about = "A same-site crawler feeding a search index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and print the effective settings
    Check,

    /// Crawl one or more sites until every job finishes
    Crawl {
        /// Base URLs; only links starting with a job's base URL are followed
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Search the pages indexed for a crawl job
    Search {
        /// Job id printed by `crawl`
        #[arg(value_name = "JOB_ID")]
        job_id: JobId,

        /// Case-insensitive text to look for; empty lists every page
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of hits to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Check => handle_check(&config),
        Command::Crawl { urls } => handle_crawl(&config, &urls).await,
        Command::Search {
            job_id,
            query,
            limit,
        } => handle_search(&config, job_id, &query, limit),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_indexer=info,warn"),
            1 => EnvFilter::new("site_indexer=debug,info"),
            2 => EnvFilter::new("site_indexer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `check`: prints the effective configuration
fn handle_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Site-Indexer Configuration ===\n");

    println!("Crawler:");
    println!("  Max distance: {}", config.crawler.max_distance);
    println!("  Max job duration: {}s", config.crawler.max_job_duration_secs);
    println!("  Idle timeout: {}s", config.crawler.idle_timeout_secs);
    println!("  Loop ceiling: {} min", config.crawler.max_run_minutes);
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);
    println!("  Batch size: {}", config.crawler.batch_size);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles `crawl`: runs the orchestrator until every submitted job finishes
async fn handle_crawl(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    let orchestrator =
        Orchestrator::from_config(config).context("Failed to initialize the crawler")?;

    let mut job_ids = Vec::with_capacity(urls.len());
    for url in urls {
        let job_id = orchestrator
            .submit_crawl(url)
            .with_context(|| format!("Failed to submit {}", url))?;
        println!("Submitted {} as job {}", url, job_id);
        job_ids.push(job_id);
    }

    orchestrator.start().await?;

    let poll = config.crawler.poll_interval();
    let wait_all = async {
        for job_id in &job_ids {
            orchestrator.wait_for_job(*job_id, poll).await?;
        }
        Ok::<(), site_indexer::IndexerError>(())
    };

    tokio::select! {
        result = wait_all => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, stopping crawl");
        }
    }

    orchestrator.stop().await;

    println!();
    for job in orchestrator.list_jobs() {
        print_job(&job);
    }
    Ok(())
}

/// Handles `search`: queries the index stored in the configured database
fn handle_search(config: &Config, job_id: JobId, query: &str, limit: usize) -> anyhow::Result<()> {
    let storage = open_storage(
        Path::new(&config.storage.database_path),
        config.crawler.batch_size,
    )
    .with_context(|| format!("Failed to open {}", config.storage.database_path))?;

    let hits = storage.search(job_id, query, limit)?;
    if hits.is_empty() {
        println!("No pages found for job {}", job_id);
        return Ok(());
    }

    for hit in hits {
        println!(
            "[{}] {} (distance {})",
            hit.score, hit.document.source_url, hit.document.distance
        );
    }
    Ok(())
}

fn print_job(job: &CrawlJob) {
    println!("Job {}", job.id);
    println!("  Base URL: {}", job.base_url);
    println!("  State: {} ({})", job.state, job.finish_reason);
    println!("  Pages indexed: {}", job.pages_indexed);
    println!("  Pages failed: {}", job.pages_failed);
    println!("  Max distance reached: {}", job.max_distance_reached);
}
