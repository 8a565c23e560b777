//! Integration tests for whole crawls
//!
//! These tests use wiremock to create mock forum servers and run the
//! pager → crawler → dispatcher cycle end-to-end.

use bbcrawl::cli::Invocation;
use bbcrawl::config::CrawlSettings;
use bbcrawl::report::{MemoryReporter, Outcome};
use bbcrawl::{crawl, CrawlContext, CrawlError};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn thread_page(page: u32) -> String {
    format!(
        r#"<html><head><title>Thread, page {page}</title></head><body>
            <div class="post"><img src="/img/p{page}-a.jpg"></div>
            <div class="post"><img src="/img/p{page}-b.jpg"></div>
        </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/html; charset=utf-8")
        .set_body_string(body)
}

/// Serves every path under /img/ with the path as body
async fn mount_images(server: &MockServer) {
    Mock::given(method("GET"))
        .and(wiremock::matchers::path_regex(r"^/img/"))
        .respond_with(|request: &Request| {
            ResponseTemplate::new(200).set_body_string(request.url.path().to_string())
        })
        .mount(server)
        .await;
}

/// Mounts a three page vBulletin thread at /thread
async fn mount_thread(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/thread"))
        .respond_with(html(thread_page(1)))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thread/page2"))
        .respond_with(html(thread_page(2)))
        .expect(1)
        .mount(server)
        .await;
}

fn args(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

fn context(
    dir: &TempDir,
    pager: &str,
    pager_args: &str,
    crawler: &str,
    crawler_args: &str,
    url: &str,
    reporter: Arc<MemoryReporter>,
) -> CrawlContext {
    let mut settings = CrawlSettings::new(dir.path());
    settings.jobs = 2;
    let mut ctx = CrawlContext::new(pager, crawler, Arc::new(settings))
        .unwrap()
        .with_reporter(reporter);
    ctx.pager.set_options(&args(pager_args)).unwrap();
    ctx.pager.set_url(url).unwrap();
    ctx.crawler.set_options(&args(crawler_args)).unwrap();
    ctx
}

fn sorted_files(outcomes: &[Outcome]) -> Vec<String> {
    let mut files: Vec<String> = outcomes
        .iter()
        .map(|o| o.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn test_three_page_thread() {
    let server = MockServer::start().await;
    mount_thread(&server).await;
    Mock::given(method("GET"))
        .and(path("/thread/page3"))
        .respond_with(html(thread_page(3)))
        .expect(1)
        .mount(&server)
        .await;
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    let reporter = Arc::new(MemoryReporter::new());
    let ctx = context(
        &dir,
        "vb4",
        "--start 1 --end 3",
        "img",
        "",
        &format!("{}/thread", server.uri()),
        reporter.clone(),
    );

    let summary = crawl(ctx).await.unwrap();
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.failed, 0);

    let outcomes = reporter.outcomes();
    assert_eq!(outcomes.len(), 6);
    assert!(outcomes.iter().all(|o| o.error.is_none()));
    assert_eq!(
        sorted_files(&outcomes),
        vec!["1-1.jpg", "1-2.jpg", "2-1.jpg", "2-2.jpg", "3-1.jpg", "3-2.jpg"]
    );

    let mut ids: Vec<u64> = outcomes.iter().map(|o| o.id).collect();
    ids.sort();
    assert_eq!(ids, (1..=6).collect::<Vec<u64>>());

    assert_eq!(
        std::fs::read_to_string(dir.path().join("2-2.jpg")).unwrap(),
        "/img/p2-b.jpg"
    );
}

#[tokio::test]
async fn test_page_error_aborts_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thread"))
        .respond_with(html(thread_page(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thread/page2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thread/page3"))
        .respond_with(html(thread_page(3)))
        .expect(0)
        .mount(&server)
        .await;
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    let reporter = Arc::new(MemoryReporter::new());
    let ctx = context(
        &dir,
        "vb4",
        "--start 1 --end 3",
        "img",
        "",
        &format!("{}/thread", server.uri()),
        reporter.clone(),
    );

    let err = crawl(ctx).await.unwrap_err();
    assert!(matches!(err, CrawlError::Status { status: 500, .. }));

    // Downloads of page 1 were drained before the crawl returned
    let outcomes = reporter.outcomes();
    assert_eq!(sorted_files(&outcomes), vec!["1-1.jpg", "1-2.jpg"]);
    assert!(dir.path().join("1-2.jpg").is_file());
}

#[tokio::test]
async fn test_timeout_on_second_page_aborts_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thread"))
        .respond_with(html(thread_page(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thread/page2"))
        .respond_with(html(thread_page(2)).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thread/page3"))
        .respond_with(html(thread_page(3)))
        .expect(0)
        .mount(&server)
        .await;
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    let mut settings = CrawlSettings::new(dir.path());
    settings.timeout = Duration::from_secs(1);
    let reporter = Arc::new(MemoryReporter::new());
    let mut ctx = CrawlContext::new("vb4", "img", Arc::new(settings))
        .unwrap()
        .with_reporter(reporter.clone());
    ctx.pager.set_options(&args("--start 1 --end 3")).unwrap();
    ctx.pager.set_url(&format!("{}/thread", server.uri())).unwrap();
    ctx.crawler.set_options(&[]).unwrap();

    let err = crawl(ctx).await.unwrap_err();
    assert!(matches!(err, CrawlError::Http { .. }));
    assert_eq!(sorted_files(&reporter.outcomes()), vec!["1-1.jpg", "1-2.jpg"]);
}

#[tokio::test]
async fn test_transport_error_aborts_crawl() {
    let dir = TempDir::new().unwrap();
    let reporter = Arc::new(MemoryReporter::new());

    // Nothing listens on port 9 of localhost
    let ctx = context(
        &dir,
        "vb4",
        "--start 1 --end 2",
        "img",
        "",
        "http://127.0.0.1:9/thread",
        reporter.clone(),
    );

    let err = crawl(ctx).await.unwrap_err();
    assert!(matches!(err, CrawlError::Http { .. }));
    assert!(reporter.outcomes().is_empty());
}

#[tokio::test]
async fn test_download_failures_do_not_abort() {
    let server = MockServer::start().await;
    mount_thread(&server).await;
    Mock::given(method("GET"))
        .and(path("/img/p2-a.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("1-1.jpg"), "kept").unwrap();

    let reporter = Arc::new(MemoryReporter::new());
    let ctx = context(
        &dir,
        "vb4",
        "--start 1 --end 2",
        "img",
        "",
        &format!("{}/thread", server.uri()),
        reporter.clone(),
    );

    let summary = crawl(ctx).await.unwrap();
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 2);

    let failed: Vec<String> = reporter
        .outcomes()
        .into_iter()
        .filter(|o| o.error.is_some())
        .map(|o| o.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&"1-1.jpg".to_string()));
    assert!(failed.contains(&"2-1.jpg".to_string()));

    assert_eq!(std::fs::read_to_string(dir.path().join("1-1.jpg")).unwrap(), "kept");
    assert!(!dir.path().join("2-1.jpg").exists());
}

#[tokio::test]
async fn test_query_pager_with_attachments() {
    let server = MockServer::start().await;
    for page in 1..=2 {
        let body = format!(
            r#"<html><body><div id="posts">
                <div id="post_{page}0"><a id="attachment{page}" href="/img/file{page}.zip">zip</a></div>
            </div></body></html>"#
        );
        Mock::given(method("GET"))
            .and(path("/showthread.php"))
            .and(query_param("t", "77"))
            .and(query_param("page", page.to_string()))
            .respond_with(html(body))
            .expect(1)
            .mount(&server)
            .await;
    }
    mount_images(&server).await;

    let dir = TempDir::new().unwrap();
    let reporter = Arc::new(MemoryReporter::new());
    let ctx = context(
        &dir,
        "query",
        "--start 1 --end 2",
        "vb-attachments",
        "",
        &format!("{}/showthread.php?t=77", server.uri()),
        reporter.clone(),
    );

    let summary = crawl(ctx).await.unwrap();
    assert_eq!(summary.pages, 2);
    assert_eq!(
        sorted_files(&reporter.outcomes()),
        vec!["10 - file1.zip", "20 - file2.zip"]
    );
}

#[tokio::test]
async fn test_command_line_invocation() {
    let server = MockServer::start().await;
    for n in [5, 10] {
        Mock::given(method("GET"))
            .and(path(format!("/archive/t-{:03}.html", n)))
            .respond_with(html(format!(
                r#"<html><body><img class="full" src="/img/{n}.png"><img src="/img/thumb{n}.png"></body></html>"#
            )))
            .expect(1)
            .mount(&server)
            .await;
    }
    mount_images(&server).await;

    let tokens = args(&format!(
        "format --start 1 --end 2 --step 5 --crawler img --attrs class=full {}/archive/t-%03d.html",
        server.uri()
    ));
    let invocation = Invocation::partition(&tokens).unwrap();

    let dir = TempDir::new().unwrap();
    let reporter = Arc::new(MemoryReporter::new());
    let mut ctx = CrawlContext::new(
        &invocation.pager,
        &invocation.crawler,
        Arc::new(CrawlSettings::new(dir.path())),
    )
    .unwrap()
    .with_reporter(reporter.clone());
    ctx.pager.set_options(&invocation.pager_args).unwrap();
    ctx.pager.set_url(&invocation.url).unwrap();
    ctx.crawler.set_options(&invocation.crawler_args).unwrap();

    let summary = crawl(ctx).await.unwrap();
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(sorted_files(&reporter.outcomes()), vec!["1-1.png", "2-1.png"]);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("2-1.png")).unwrap(),
        "/img/10.png"
    );
}
