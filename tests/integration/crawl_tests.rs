//! Integration tests for the crawl → convert → archive pipeline
//!
//! These tests use wiremock to create mock HTTP servers and check the
//! finished zip archive end-to-end.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use sumi_scroll::config::Config;
use sumi_scroll::{run_crawl, RejectReason};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to `output`
fn create_test_config(output: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages = 50;
    config.crawler.max_depth = 3;
    config.crawler.concurrency = 4;
    config.crawler.respect_robots_txt = false;
    config.fetcher.max_retries = 2;
    config.fetcher.retry_base_delay_ms = 10;
    config.converter.concurrency = 2;
    config.archive.output_path = output.display().to_string();
    config
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body><main>{}</main></body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

/// Names of all file entries (directories excluded) in the archive
fn archive_files(path: &Path) -> BTreeSet<String> {
    let archive = zip::ZipArchive::new(File::open(path).expect("open archive"))
        .expect("read archive");
    archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(|name| name.to_string())
        .collect()
}

fn read_entry(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).expect("open archive"))
        .expect("read archive");
    let mut entry = archive.by_name(name).expect("entry exists");
    let mut content = String::new();
    entry.read_to_string(&mut content).expect("utf-8 entry");
    content
}

fn host_of(server: &MockServer) -> String {
    url::Url::parse(&server.uri())
        .expect("mock server URI")
        .host_str()
        .expect("mock server host")
        .to_string()
}

#[tokio::test]
async fn test_single_page_without_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "<p>Nothing to see here.</p>").await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.zip");
    let artifact = run_crawl(&server.uri(), create_test_config(&output))
        .await
        .expect("crawl succeeds");

    let index = format!("web/{}/index.md", host_of(&server));
    let files = archive_files(&output);
    assert_eq!(
        files,
        ["summary.md".to_string(), index.clone()].into_iter().collect()
    );

    assert_eq!(artifact.manifest.total_pages, 1);
    assert_eq!(artifact.manifest.successes, 1);
    assert_eq!(artifact.manifest.failures, 0);

    let index_md = read_entry(&output, &index);
    assert!(index_md.contains("Nothing to see here."));

    // summary.md is the first entry
    let mut archive = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
    assert_eq!(archive.by_index(0).unwrap().name(), "summary.md");
}

#[tokio::test]
async fn test_out_of_scope_links_rejected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/docs">Docs</a>
           <a href="/blog">Blog</a>
           <a href="/about">About</a>
           <a href="https://other-site.example/x">Elsewhere</a>
           <a href="https://another-site.example/y">Also elsewhere</a>"#,
    )
    .await;
    mount_page(&server, "/docs", "Docs", "<p>Documentation</p>").await;
    mount_page(&server, "/blog", "Blog", "<p>Posts</p>").await;
    mount_page(&server, "/about", "About", "<p>About us</p>").await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.zip");
    let artifact = run_crawl(&server.uri(), create_test_config(&output))
        .await
        .expect("crawl succeeds");

    let manifest = &artifact.manifest;
    assert_eq!(manifest.total_pages, 4);
    assert_eq!(manifest.successes, 4);
    assert_eq!(manifest.rejected.get(&RejectReason::OutOfScope), Some(&2));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);

    let host = host_of(&server);
    let files = archive_files(&output);
    for slug in ["docs", "blog", "about"] {
        assert!(
            files.contains(&format!("web/{}/pages/{}.md", host, slug)),
            "missing page {} in {:?}",
            slug,
            files
        );
    }

    let index_md = read_entry(&output, &format!("web/{}/index.md", host));
    assert!(index_md.contains("## Contents"));
    assert!(index_md.contains("[[pages/docs|Docs]]"));
}

#[tokio::test]
async fn test_failing_page_listed_in_manifest() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/one">1</a><a href="/two">2</a><a href="/three">3</a><a href="/down">down</a>"#,
    )
    .await;
    mount_page(&server, "/one", "One", "<p>one</p>").await;
    mount_page(&server, "/two", "Two", "<p>two</p>").await;
    mount_page(&server, "/three", "Three", "<p>three</p>").await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.zip");
    let artifact = run_crawl(&server.uri(), create_test_config(&output))
        .await
        .expect("crawl succeeds despite a failing page");

    let manifest = &artifact.manifest;
    assert_eq!(manifest.successes, 4);
    assert_eq!(manifest.failures, 1);
    assert_eq!(manifest.total_pages, 5);
    assert_eq!(manifest.failed.len(), 1);
    assert!(manifest.failed[0].url.ends_with("/down"));
    assert!(manifest.failed[0].error.contains("503"));

    let summary = read_entry(&output, "summary.md");
    assert!(summary.contains("## Failures"));
    assert!(summary.contains("/down"));

    let host = host_of(&server);
    let files = archive_files(&output);
    for slug in ["one", "two", "three"] {
        assert!(files.contains(&format!("web/{}/pages/{}.md", host, slug)));
    }
    assert!(!files.iter().any(|f| f.contains("down")));
}

#[tokio::test]
async fn test_shared_image_archived_once() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/first">First</a><a href="/second">Second</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/first",
        "First",
        r#"<p>First page</p><img src="/img/shared.png" alt="Shared">"#,
    )
    .await;
    mount_page(
        &server,
        "/second",
        "Second",
        r#"<p>Second page</p><img src="/img/shared.png" alt="Shared">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/shared.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.zip");
    let artifact = run_crawl(&server.uri(), create_test_config(&output))
        .await
        .expect("crawl succeeds");

    let files = archive_files(&output);
    let images: Vec<_> = files.iter().filter(|f| f.ends_with(".png")).collect();
    assert_eq!(images.len(), 1, "images in archive: {:?}", images);
    assert_eq!(artifact.manifest.total_images, 1);

    let host = host_of(&server);
    for slug in ["first", "second"] {
        let page = read_entry(&output, &format!("web/{}/pages/{}.md", host, slug));
        assert!(page.contains("](../assets/shared.png)"), "{}", page);
    }
}

#[tokio::test]
async fn test_budget_of_one_fetches_only_root() {
    let server = MockServer::start().await;
    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/page-{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", "Home", &links).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.zip");
    let mut config = create_test_config(&output);
    config.crawler.max_pages = 1;

    let artifact = run_crawl(&server.uri(), config).await.expect("crawl succeeds");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/");

    assert_eq!(artifact.manifest.total_pages, 1);
    assert_eq!(
        artifact.manifest.rejected.get(&RejectReason::BudgetExhausted),
        Some(&10)
    );
    assert_eq!(archive_files(&output).len(), 2);
}

#[tokio::test]
async fn test_robots_disallowed_pages_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/public">Public</a><a href="/private">Private</a>"#,
    )
    .await;
    mount_page(&server, "/public", "Public", "<p>open</p>").await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html_page("Private", "<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.zip");
    let mut config = create_test_config(&output);
    config.crawler.respect_robots_txt = true;

    let artifact = run_crawl(&server.uri(), config).await.expect("crawl succeeds");

    assert_eq!(artifact.manifest.successes, 2);
    assert_eq!(
        artifact.manifest.rejected.get(&RejectReason::RobotsDisallowed),
        Some(&1)
    );
}

#[tokio::test]
async fn test_rerun_produces_same_file_names() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/guide/intro">Intro</a><a href="/guide/setup">Setup</a><a href="/faq">FAQ</a>"#,
    )
    .await;
    mount_page(&server, "/guide/intro", "Intro", "<p>intro</p>").await;
    mount_page(&server, "/guide/setup", "Setup", "<p>setup</p>").await;
    mount_page(&server, "/faq", "FAQ", "<p>questions</p>").await;

    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.zip");
    let second = dir.path().join("second.zip");

    run_crawl(&server.uri(), create_test_config(&first))
        .await
        .expect("first crawl");
    run_crawl(&server.uri(), create_test_config(&second))
        .await
        .expect("second crawl");

    let first_files = archive_files(&first);
    assert_eq!(first_files, archive_files(&second));

    let host = host_of(&server);
    assert!(first_files.contains(&format!("web/{}/pages/guide-intro.md", host)));
}

#[tokio::test]
async fn test_invalid_root_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.zip");

    let result = run_crawl("mailto:someone@example.com", create_test_config(&output)).await;

    assert!(matches!(
        result,
        Err(sumi_scroll::ScrollError::InvalidRoot { .. })
    ));
    assert!(!output.exists());
}
