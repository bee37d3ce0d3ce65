//! Integration tests for the search-filter-download pipeline.
//!
//! Search results come from an in-process backend; documents are served by a
//! wiremock server on 127.0.0.1, which is put on the allow-list.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdf_crawler_core::{
    CrawlConfig, DownloadOutcome, LinkReport, SearchBackend, SearchError, SearchResult,
    parse_cutoff_date, run_crawl_with_backend,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return Ok(());
        };
        mock_server
    }};
}

// ==================== Helpers ====================

/// Serves whole pages of links in order, then empty pages.
struct PagedBackend {
    pages: Mutex<VecDeque<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl PagedBackend {
    fn new(pages: Vec<Vec<String>>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                pages: Mutex::new(pages.into()),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl SearchBackend for PagedBackend {
    fn name(&self) -> &'static str {
        "paged"
    }

    async fn fetch_page(
        &self,
        _query: &str,
        _start: u32,
        _page_size: u32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page = self.pages.lock().unwrap().pop_front().unwrap_or_default();
        Ok(page.into_iter().map(SearchResult::new).collect())
    }
}

fn test_config(temp: &TempDir, target: usize) -> CrawlConfig {
    let mut config = CrawlConfig::new("key", "cx", "bericht filetype:pdf");
    config.target = target;
    config.allowed_tlds = vec!["127.0.0.1".to_string()];
    config.output_dir = temp.path().join("out");
    config.manifest_path = temp.path().join("crawled_pdfs.csv");
    config
}

/// Mounts HEAD and GET for a PDF, each expected `hits` times.
async fn mount_pdf(
    server: &MockServer,
    route: &str,
    body: &[u8],
    last_modified: Option<&str>,
    hits: u64,
) {
    let mut head = ResponseTemplate::new(200).set_body_raw(body.to_vec(), "application/pdf");
    if let Some(value) = last_modified {
        head = head.insert_header("last-modified", value);
    }
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(head)
        .expect(hits)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), "application/pdf"))
        .expect(hits)
        .mount(server)
        .await;
}

/// Mounts a GET that must never be requested.
async fn forbid_get(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

fn manifest_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .split("\r\n")
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn outcomes(reports: &[LinkReport]) -> Vec<DownloadOutcome> {
    reports.iter().map(|r| r.outcome).collect()
}

// ==================== Scenarios ====================

#[tokio::test]
async fn test_target_reached_within_first_batch() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    let mut links = Vec::new();
    for i in 0..5 {
        links.push(format!("https://example.com/foreign{i}.pdf"));
    }
    for i in 0..3 {
        let route = format!("/page{i}.pdf");
        Mock::given(method("HEAD"))
            .and(path(route.as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"<html></html>".to_vec(), "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
        forbid_get(&server, &route).await;
        links.push(format!("{}{route}", server.uri()));
    }
    for i in 0..17 {
        let route = format!("/doc{i}.pdf");
        let hits = if i < 15 { 1 } else { 0 };
        mount_pdf(&server, &route, b"%PDF-1.4 test", None, hits).await;
        links.push(format!("{}{route}", server.uri()));
    }
    assert_eq!(links.len(), 25);

    let (backend, calls) = PagedBackend::new(vec![links]);
    let config = test_config(&temp, 15);
    let mut reports = Vec::new();

    let stats = run_crawl_with_backend(&config, Box::new(backend), |r| reports.push(r.clone()))
        .await?;

    assert_eq!(stats.saved(), 15);
    assert_eq!(stats.skipped(), 8);
    assert_eq!(stats.count(DownloadOutcome::SkippedInvalidDomain), 5);
    assert_eq!(stats.count(DownloadOutcome::SkippedNotPdf), 3);
    assert_eq!(stats.unprocessed(), 2);
    assert_eq!(stats.requeries(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(reports.len(), 23);

    let saved: Vec<_> = std::fs::read_dir(&config.output_dir)?.collect();
    assert_eq!(saved.len(), 15);
    // header + one row per saved document
    assert_eq!(manifest_lines(&config.manifest_path).len(), 16);
    Ok(())
}

#[tokio::test]
async fn test_missing_or_unparseable_last_modified_passes_cutoff()
-> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    mount_pdf(&server, "/undated.pdf", b"%PDF-a", None, 1).await;
    mount_pdf(&server, "/garbled.pdf", b"%PDF-b", Some("last tuesday"), 1).await;
    Mock::given(method("HEAD"))
        .and(path("/ancient.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-c".to_vec(), "application/pdf")
                .insert_header("last-modified", "Sun, 06 Nov 1994 08:49:37 GMT"),
        )
        .mount(&server)
        .await;
    forbid_get(&server, "/ancient.pdf").await;

    let links = vec![
        format!("{}/ancient.pdf", server.uri()),
        format!("{}/undated.pdf", server.uri()),
        format!("{}/garbled.pdf", server.uri()),
    ];
    let (backend, _) = PagedBackend::new(vec![links]);
    let mut config = test_config(&temp, 2);
    config.cutoff = Some(parse_cutoff_date("2023-01-01")?);
    let mut reports = Vec::new();

    let stats = run_crawl_with_backend(&config, Box::new(backend), |r| reports.push(r.clone()))
        .await?;

    assert_eq!(
        outcomes(&reports),
        vec![
            DownloadOutcome::SkippedTooOld,
            DownloadOutcome::Saved,
            DownloadOutcome::Saved
        ]
    );
    assert_eq!(stats.saved(), 2);
    // no usable date, so no prefix
    assert!(config.output_dir.join("undated.pdf").is_file());
    assert!(config.output_dir.join("garbled.pdf").is_file());
    Ok(())
}

#[tokio::test]
async fn test_probe_failure_skips_without_fetch() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    Mock::given(method("HEAD"))
        .and(path("/broken.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    forbid_get(&server, "/broken.pdf").await;

    let (backend, _) = PagedBackend::new(vec![vec![format!("{}/broken.pdf", server.uri())]]);
    let config = test_config(&temp, 1);
    let mut reports = Vec::new();

    let stats = run_crawl_with_backend(&config, Box::new(backend), |r| reports.push(r.clone()))
        .await?;

    assert_eq!(outcomes(&reports), vec![DownloadOutcome::SkippedFetchError]);
    assert_eq!(
        reports[0].message(),
        format!("Error fetching {}/broken.pdf. Skipping.", server.uri())
    );
    assert_eq!(stats.saved(), 0);
    assert_eq!(manifest_lines(&config.manifest_path), vec!["URL,Filename"]);
    Ok(())
}

#[tokio::test]
async fn test_fetch_failure_leaves_no_file_or_row() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    Mock::given(method("HEAD"))
        .and(path("/gone.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (backend, _) = PagedBackend::new(vec![vec![format!("{}/gone.pdf", server.uri())]]);
    let config = test_config(&temp, 1);
    let mut reports = Vec::new();

    run_crawl_with_backend(&config, Box::new(backend), |r| reports.push(r.clone())).await?;

    assert_eq!(outcomes(&reports), vec![DownloadOutcome::SkippedFetchError]);
    assert_eq!(std::fs::read_dir(&config.output_dir)?.count(), 0);
    assert_eq!(manifest_lines(&config.manifest_path).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_size_limit_uses_reported_length() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    Mock::given(method("HEAD"))
        .and(path("/huge.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0u8; 500], "application/pdf"),
        )
        .mount(&server)
        .await;
    forbid_get(&server, "/huge.pdf").await;
    mount_pdf(&server, "/small.pdf", &[0u8; 50], None, 1).await;

    let links = vec![
        format!("{}/huge.pdf", server.uri()),
        format!("{}/small.pdf", server.uri()),
    ];
    let (backend, _) = PagedBackend::new(vec![links]);
    let mut config = test_config(&temp, 1);
    config.max_size = Some(100);
    let mut reports = Vec::new();

    let stats = run_crawl_with_backend(&config, Box::new(backend), |r| reports.push(r.clone()))
        .await?;

    assert_eq!(
        outcomes(&reports),
        vec![DownloadOutcome::SkippedTooLarge, DownloadOutcome::Saved]
    );
    assert_eq!(stats.saved(), 1);
    assert_eq!(reports[1].bytes, 50);
    Ok(())
}

#[tokio::test]
async fn test_date_prefix_from_last_modified() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    mount_pdf(
        &server,
        "/reports/jahresbericht.pdf",
        b"%PDF-1.7",
        Some("Wed, 01 Mar 2023 10:00:00 GMT"),
        1,
    )
    .await;

    let url = format!("{}/reports/jahresbericht.pdf", server.uri());
    let (backend, _) = PagedBackend::new(vec![vec![url.clone()]]);
    let config = test_config(&temp, 1);
    let mut reports = Vec::new();

    run_crawl_with_backend(&config, Box::new(backend), |r| reports.push(r.clone())).await?;

    let expected = config.output_dir.join("20230301_jahresbericht.pdf");
    assert_eq!(reports[0].stored_path.as_deref(), Some(expected.as_path()));
    assert_eq!(std::fs::read(&expected)?, b"%PDF-1.7");
    assert_eq!(
        manifest_lines(&config.manifest_path),
        vec![
            "URL,Filename".to_string(),
            format!("{url},{}", expected.display())
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_shared_final_segment_overwrites_and_records_both()
-> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    mount_pdf(&server, "/a/report.pdf", b"first", None, 1).await;
    mount_pdf(&server, "/b/report.pdf", b"second", None, 1).await;

    let first = format!("{}/a/report.pdf", server.uri());
    let second = format!("{}/b/report.pdf", server.uri());
    let (backend, _) = PagedBackend::new(vec![vec![first.clone(), second.clone()]]);
    let config = test_config(&temp, 2);

    let stats = run_crawl_with_backend(&config, Box::new(backend), |_| {}).await?;

    assert_eq!(stats.saved(), 2);
    let stored = config.output_dir.join("report.pdf");
    assert_eq!(std::fs::read(&stored)?, b"second");
    assert_eq!(std::fs::read_dir(&config.output_dir)?.count(), 1);
    assert_eq!(
        manifest_lines(&config.manifest_path),
        vec![
            "URL,Filename".to_string(),
            format!("{first},{}", stored.display()),
            format!("{second},{}", stored.display()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_overlong_final_segment_is_saved_under_shortened_name()
-> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    let long_route = format!("/{}.pdf", "a".repeat(300));
    mount_pdf(&server, &long_route, b"%PDF-long", Some("Mon, 06 Mar 2023 12:00:00 GMT"), 1)
        .await;
    mount_pdf(&server, "/ok.pdf", b"%PDF-ok", None, 1).await;

    let links = vec![
        format!("{}{long_route}", server.uri()),
        format!("{}/ok.pdf", server.uri()),
    ];
    let (backend, _) = PagedBackend::new(vec![links]);
    let config = test_config(&temp, 2);
    let mut reports = Vec::new();

    let stats = run_crawl_with_backend(&config, Box::new(backend), |r| reports.push(r.clone()))
        .await?;

    assert_eq!(stats.saved(), 2);
    assert_eq!(outcomes(&reports), vec![DownloadOutcome::Saved; 2]);
    let stored = reports[0].stored_path.clone().unwrap();
    let name = stored.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("20230306_aaa"));
    assert!(name.ends_with(".pdf"));
    assert!(name.len() < 255);
    assert_eq!(std::fs::read(&stored)?, b"%PDF-long");
    assert_eq!(std::fs::read(config.output_dir.join("ok.pdf"))?, b"%PDF-ok");
    assert_eq!(manifest_lines(&config.manifest_path).len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_manifest_accumulates_across_runs() -> Result<(), Box<dyn std::error::Error>> {
    let server = require_mock_server!();
    let temp = TempDir::new()?;

    mount_pdf(&server, "/one.pdf", b"1", None, 1).await;
    mount_pdf(&server, "/two.pdf", b"2", None, 1).await;

    let config = test_config(&temp, 1);
    let (backend, _) = PagedBackend::new(vec![vec![format!("{}/one.pdf", server.uri())]]);
    run_crawl_with_backend(&config, Box::new(backend), |_| {}).await?;
    let (backend, _) = PagedBackend::new(vec![vec![format!("{}/two.pdf", server.uri())]]);
    run_crawl_with_backend(&config, Box::new(backend), |_| {}).await?;

    let lines = manifest_lines(&config.manifest_path);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines.iter().filter(|l| *l == "URL,Filename").count(), 1);
    assert!(lines[1].ends_with("one.pdf"));
    assert!(lines[2].ends_with("two.pdf"));
    Ok(())
}

#[tokio::test]
async fn test_requery_stops_on_empty_page() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let page = |tag: &str| -> Vec<String> {
        (0..10)
            .map(|i| format!("https://{tag}.example.com/{i}.pdf"))
            .collect()
    };

    let (backend, calls) = PagedBackend::new(vec![page("a"), page("b")]);
    let config = test_config(&temp, 5);

    let stats = run_crawl_with_backend(&config, Box::new(backend), |_| {}).await?;

    assert_eq!(stats.saved(), 0);
    assert_eq!(stats.count(DownloadOutcome::SkippedInvalidDomain), 20);
    assert_eq!(stats.requeries(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_search_failure_ends_run_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_page(
            &self,
            _query: &str,
            start: u32,
            _page_size: u32,
        ) -> Result<Vec<SearchResult>, SearchError> {
            Err(SearchError::HttpStatus {
                start,
                status: 429,
                message: "quota exceeded".to_string(),
            })
        }
    }

    let temp = TempDir::new()?;
    let config = test_config(&temp, 3);

    let stats = run_crawl_with_backend(&config, Box::new(FailingBackend), |_| {}).await?;

    assert_eq!(stats.total(), 0);
    assert!(config.manifest_path.is_file());
    Ok(())
}
