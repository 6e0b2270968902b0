//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use site_indexer::config::{Config, CrawlerConfig, StorageConfig, UserAgentConfig};
use site_indexer::crawler::{crawl_site, HttpFetcher};
use site_indexer::storage::{open_storage, MemoryFrontier, MemoryIndex};
use site_indexer::{FinishReason, FrontierQueue, FrontierRecord, IndexSink, IndexerError, JobState};
use site_indexer::{CrawlJob, JobId, Orchestrator};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawler configuration suited to a local mock server
fn test_crawler_config(max_distance: u32) -> CrawlerConfig {
    CrawlerConfig {
        max_distance,
        max_job_duration_secs: 60,
        idle_timeout_secs: 1,
        max_run_minutes: 1,
        poll_interval_ms: 10,
        batch_size: 10,
    }
}

fn memory_orchestrator(
    max_distance: u32,
) -> (Orchestrator, Arc<MemoryFrontier>, Arc<MemoryIndex>) {
    let queue = Arc::new(MemoryFrontier::new(10));
    let index = Arc::new(MemoryIndex::new());
    let fetcher = HttpFetcher::from_config(&UserAgentConfig::default())
        .expect("Failed to build HTTP client");
    let orchestrator = Orchestrator::new(
        test_crawler_config(max_distance),
        queue.clone(),
        Arc::new(fetcher),
        index.clone(),
    );
    (orchestrator, queue, index)
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn wait_for(orchestrator: &Orchestrator, job_id: JobId) -> CrawlJob {
    tokio::time::timeout(
        Duration::from_secs(15),
        orchestrator.wait_for_job(job_id, Duration::from_millis(10)),
    )
    .await
    .expect("Crawl did not finish in time")
    .expect("Job disappeared")
}

#[tokio::test]
async fn test_only_same_site_links_are_followed() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/",
        format!(
            r#"<html><body>
                <a href="{}/a">About</a>
                <a href="http://other.com/b">Partner</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;

    let (orchestrator, queue, index) = memory_orchestrator(10);
    let job_id = orchestrator.submit_crawl(&base_url).unwrap();

    let report = orchestrator.run_once().await.unwrap();
    assert_eq!(report.received, 1);
    assert_eq!(report.indexed, 1);

    assert_eq!(
        queue.snapshot(),
        vec![FrontierRecord::new(job_id, format!("{}/a", base_url), 1)]
    );

    let documents = index.documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].source_url, base_url);
    assert_eq!(documents[0].base_url, base_url);
    assert_eq!(documents[0].text, "About Partner");
}

#[tokio::test]
async fn test_crawl_finishes_on_distance_limit() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(&server, "/", r#"<a href="/a">A</a>"#.to_string()).await;
    mount_html(&server, "/a", r#"<a href="/b">B</a>"#.to_string()).await;
    mount_html(&server, "/b", r#"<a href="/c">C</a>"#.to_string()).await;

    let (orchestrator, queue, index) = memory_orchestrator(3);
    orchestrator.start().await.unwrap();
    let job_id = orchestrator.submit_crawl(&base_url).unwrap();

    let job = wait_for(&orchestrator, job_id).await;
    orchestrator.stop().await;

    assert_eq!(job.state, JobState::Finished);
    assert_eq!(job.finish_reason, FinishReason::MaxDistance);
    assert!(job.finished_at.is_some());
    assert_eq!(job.pages_indexed, 2);
    assert_eq!(index.len(), 2);
    assert_eq!(queue.pending().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_pages_do_not_fail_the_job() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/",
        r#"<a href="/report.pdf">Report</a>
           <a href="/missing">Gone</a>
           <a href="/ok">Fine</a>"#
            .to_string(),
    )
    .await;
    mount_html(&server, "/ok", "<p>No links here</p>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let (orchestrator, _, index) = memory_orchestrator(10);
    orchestrator.start().await.unwrap();
    let job_id = orchestrator.submit_crawl(&base_url).unwrap();

    let job = wait_for(&orchestrator, job_id).await;
    orchestrator.stop().await;

    assert_eq!(job.finish_reason, FinishReason::EmptyQueue);
    assert_eq!(job.pages_indexed, 2);
    assert_eq!(job.pages_failed, 2);
    assert_eq!(job.max_distance_reached, 1);
    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn test_jobs_on_same_site_are_independent() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/",
        r#"<a href="/docs/intro">Intro</a><a href="/blog">Blog</a>"#.to_string(),
    )
    .await;
    mount_html(&server, "/docs", r#"<a href="/docs/intro">Intro</a><a href="/blog">Blog</a>"#.to_string()).await;
    mount_html(&server, "/docs/intro", "<p>Welcome</p>".to_string()).await;
    mount_html(&server, "/blog", "<p>News</p>".to_string()).await;

    let (orchestrator, _, index) = memory_orchestrator(10);
    orchestrator.start().await.unwrap();
    let site = orchestrator.submit_crawl(&base_url).unwrap();
    let docs = orchestrator
        .submit_crawl(&format!("{}/docs", base_url))
        .unwrap();

    let site_job = wait_for(&orchestrator, site).await;
    let docs_job = wait_for(&orchestrator, docs).await;
    orchestrator.stop().await;

    // The root crawl follows both links; the docs crawl stays under /docs
    assert_eq!(site_job.pages_indexed, 3);
    assert_eq!(docs_job.pages_indexed, 2);
    assert_eq!(index.len(), 5);
    assert_eq!(orchestrator.list_jobs().len(), 2);
}

#[tokio::test]
async fn test_crawl_site_with_sqlite_storage() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_html(
        &server,
        "/",
        r#"<a href="/about">About us</a><a href="/contact">Contact</a>"#.to_string(),
    )
    .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("index.db");
    let config = Config {
        crawler: test_crawler_config(2),
        user_agent: UserAgentConfig::default(),
        storage: StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
        },
    };

    let job = tokio::time::timeout(Duration::from_secs(15), crawl_site(&config, &base_url))
        .await
        .expect("Crawl did not finish in time")
        .unwrap();

    assert_eq!(job.finish_reason, FinishReason::MaxDistance);
    assert_eq!(job.pages_indexed, 1);

    let storage = open_storage(&db_path, 10).unwrap();
    assert_eq!(storage.count_documents(job.id).unwrap(), 1);

    let hits = storage.search(job.id, "about", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.source_url, base_url);
    assert!(storage.search(job.id, "pricing", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_crawl_site_rejects_invalid_url() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = Config {
        crawler: test_crawler_config(2),
        user_agent: UserAgentConfig::default(),
        storage: StorageConfig {
            database_path: temp_dir
                .path()
                .join("index.db")
                .to_string_lossy()
                .to_string(),
        },
    };

    let result = crawl_site(&config, "ftp://example.com").await;
    assert!(matches!(result, Err(IndexerError::UrlError(_))));
}

#[tokio::test]
async fn test_status_of_unknown_job() {
    let (orchestrator, _, _) = memory_orchestrator(10);
    let missing = JobId::new();

    assert!(matches!(
        orchestrator.get_crawl_status(missing),
        Err(IndexerError::JobNotFound(id)) if id == missing
    ));
}
