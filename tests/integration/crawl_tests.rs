//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from HEAD/GET requests to rows in SQLite.

use spider::config::{Config, CrawlerConfig, DatabaseConfig, UserAgentConfig};
use spider::crawler::Coordinator;
use spider::state::OutcomeKind;
use spider::storage::{RecordStore, SqliteStorage};
use spider::SpiderError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short retry pauses
fn create_test_config(db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_attempts: 3,
            sleep_time_ms: 10, // Very short for testing
            timeout_ms: 2000,
            flush_threshold: 100,
            max_concurrent_fetches: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
        },
        database: DatabaseConfig {
            path: db_path.display().to_string(),
        },
    }
}

fn html_page(title: &str, links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

/// Accepts HEAD for every path as HTML
async fn mount_html_head(mock_server: &MockServer) {
    Mock::given(method("HEAD"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(mock_server)
        .await;
}

async fn mount_page(mock_server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(mock_server)
        .await;
}

struct TestCrawl {
    _dir: tempfile::TempDir,
    config: Config,
    storage: Arc<SqliteStorage>,
}

impl TestCrawl {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(&dir.path().join("spider.db"));
        let storage = Arc::new(SqliteStorage::new(Path::new(&config.database.path)).unwrap());
        Self {
            _dir: dir,
            config,
            storage,
        }
    }

    fn coordinator(&self) -> Coordinator {
        Coordinator::from_config(&self.config, self.storage.clone()).unwrap()
    }

    async fn stored_urls(&self) -> HashSet<String> {
        self.storage
            .read_by_domain("", 1000, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.url)
            .collect()
    }
}

#[tokio::test]
async fn test_full_crawl_three_page_chain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_head(&mock_server).await;
    mount_page(&mock_server, "/0", html_page("Zero", &[format!("{}/1", base_url)])).await;
    mount_page(&mock_server, "/1", html_page("One", &["/2".to_string()])).await;
    mount_page(&mock_server, "/2", html_page("Two", &[])).await;

    let crawl = TestCrawl::new();
    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 2)
        .await
        .unwrap();

    assert_eq!(report.done, 3);
    assert_eq!(report.total, 3);
    assert_eq!(report.stats.count(OutcomeKind::Done), 3);

    let expected: HashSet<String> = (0..3).map(|i| format!("{}/{}", base_url, i)).collect();
    assert_eq!(crawl.stored_urls().await, expected);

    let records = crawl
        .storage
        .read_by_domain(&report.base_domain, 10, 0)
        .await
        .unwrap();
    let titles: HashSet<String> = records.into_iter().map(|p| p.title).collect();
    let expected: HashSet<String> = ["Zero", "One", "Two"].iter().map(|s| s.to_string()).collect();
    assert_eq!(titles, expected);
}

#[tokio::test]
async fn test_depth_zero_does_not_follow_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_head(&mock_server).await;
    mount_page(&mock_server, "/0", html_page("Zero", &["/1".to_string()])).await;
    Mock::given(method("GET"))
        .and(path("/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let crawl = TestCrawl::new();
    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 0)
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(crawl.stored_urls().await.len(), 1);
}

#[tokio::test]
async fn test_non_html_content_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/json"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_html_head(&mock_server).await;
    mount_page(&mock_server, "/0", html_page("Zero", &["/data".to_string()])).await;

    let crawl = TestCrawl::new();
    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 1)
        .await
        .unwrap();

    assert_eq!(report.stats.wrong_content_type("application/json"), 1);
    assert_eq!(report.total, 2);
    assert_eq!(report.done, 2);

    let expected: HashSet<String> = [format!("{}/0", base_url)].into_iter().collect();
    assert_eq!(crawl.stored_urls().await, expected);
}

#[tokio::test]
async fn test_out_of_scope_server_never_contacted() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Any request to the other server fails the test on drop
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .expect(0)
        .mount(&other_server)
        .await;

    mount_html_head(&mock_server).await;
    mount_page(
        &mock_server,
        "/0",
        html_page(
            "Zero",
            &[
                format!("{}/elsewhere", other_server.uri()),
                "mailto:someone@example.com".to_string(),
                "relative/link".to_string(),
            ],
        ),
    )
    .await;

    let crawl = TestCrawl::new();
    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 2)
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.done, 1);
}

#[tokio::test]
async fn test_undecodable_body_is_not_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_head(&mock_server).await;
    mount_page(&mock_server, "/0", html_page("Zero", &["/binary".to_string()])).await;
    Mock::given(method("GET"))
        .and(path("/binary"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0xfd, 0x80]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawl = TestCrawl::new();
    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 1)
        .await
        .unwrap();

    assert_eq!(report.stats.count(OutcomeKind::UnicodeDecodeError), 1);
    assert_eq!(crawl.stored_urls().await.len(), 1);
}

#[tokio::test]
async fn test_declared_charset_is_decoded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // "Яндекс" in windows-1251
    let mut body = b"<html><head><title>".to_vec();
    body.extend_from_slice(&[0xDF, 0xED, 0xE4, 0xE5, 0xEA, 0xF1]);
    body.extend_from_slice(b"</title></head><body></body></html>");

    Mock::given(method("HEAD"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=windows-1251"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ru"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=windows-1251"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawl = TestCrawl::new();
    let report = crawl
        .coordinator()
        .run(&format!("{}/ru", base_url), 0)
        .await
        .unwrap();

    assert_eq!(report.stats.count(OutcomeKind::UnicodeDecodeError), 0);
    let pages = crawl.storage.read_by_domain("", 10, 0).await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title, "Яндекс");
}

#[tokio::test]
async fn test_head_timeout_exhausts_attempts() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_html_head(&mock_server).await;
    mount_page(&mock_server, "/0", html_page("Zero", &["/slow".to_string()])).await;

    let mut crawl = TestCrawl::new();
    crawl.config.crawler.max_attempts = 2;
    crawl.config.crawler.timeout_ms = 100;

    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 1)
        .await
        .unwrap();

    assert_eq!(report.stats.count(OutcomeKind::ConnectionError), 1);
    assert_eq!(report.done, 2);
    assert_eq!(crawl.stored_urls().await.len(), 1);
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/0"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Zero", &[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let crawl = TestCrawl::new();
    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 0)
        .await
        .unwrap();

    assert_eq!(report.stats.count(OutcomeKind::Done), 1);
}

#[tokio::test]
async fn test_recrawl_upserts_existing_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_head(&mock_server).await;
    mount_page(&mock_server, "/0", html_page("Zero", &["/1".to_string()])).await;
    mount_page(&mock_server, "/1", html_page("One", &[])).await;

    let crawl = TestCrawl::new();
    let seed = format!("{}/0", base_url);
    crawl.coordinator().run(&seed, 1).await.unwrap();
    crawl.coordinator().run(&seed, 1).await.unwrap();

    assert_eq!(crawl.storage.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_concurrency_limit_still_crawls_everything() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: Vec<String> = (1..=8).map(|i| format!("/{}", i)).collect();
    mount_html_head(&mock_server).await;
    mount_page(&mock_server, "/0", html_page("Zero", &links)).await;
    for i in 1..=8 {
        mount_page(&mock_server, &format!("/{}", i), html_page(&i.to_string(), &[])).await;
    }

    let mut crawl = TestCrawl::new();
    crawl.config.crawler.max_concurrent_fetches = Some(2);
    crawl.config.crawler.flush_threshold = 3;

    let report = crawl
        .coordinator()
        .run(&format!("{}/0", base_url), 1)
        .await
        .unwrap();

    assert_eq!(report.done, 9);
    assert_eq!(crawl.storage.count().await.unwrap(), 9);
}

#[tokio::test]
async fn test_invalid_seed() {
    let crawl = TestCrawl::new();
    let result = crawl.coordinator().run("definitely not a url", 1).await;
    assert!(matches!(result, Err(SpiderError::Url(_))));
}
