//! End-to-end engine behavior over a mock HTTP server.
//!
//! Every test pins the direct backend so no browser is involved, and runs
//! with a zero politeness pause.

mod common;

use linkscout::{Backend, RunStatus, ScanConfig, ScanService, TraversalMode};

fn pagination_config(start_url: String, keyword: &str, max_pages: usize) -> ScanConfig {
    ScanConfig::builder(start_url, keyword)
        .backend(Backend::Direct)
        .max_pages(max_pages)
        .pause_ms(0)
        .build()
        .expect("test config must validate")
}

fn crawl_config(start_url: String, keyword: &str, max_pages: usize, max_depth: u32) -> ScanConfig {
    ScanConfig::builder(start_url, keyword)
        .backend(Backend::Direct)
        .mode(TraversalMode::SameSite { max_depth })
        .same_domain_only(true)
        .max_pages(max_pages)
        .pause_ms(0)
        .build()
        .expect("test config must validate")
}

#[tokio::test]
async fn linear_follow_stops_at_page_budget() {
    let mut server = mockito::Server::new_async().await;

    let m1 = common::html_mock(
        &mut server,
        "/t/1?page=1",
        &common::forum_page(&[("Israel update one", "/news/israel-1")], Some("/t/1?page=2")),
    )
    .await;
    let m2 = common::html_mock(
        &mut server,
        "/t/1?page=2",
        &common::forum_page(&[("Israel update two", "/news/israel-2")], Some("/t/1?page=3")),
    )
    .await;
    let m3 = common::html_mock(
        &mut server,
        "/t/1?page=3",
        &common::forum_page(&[("Israel update three", "/news/israel-3")], Some("/t/1?page=4")),
    )
    .await;
    // A fourth page exists but the budget must stop the run first.
    let m4 = server
        .mock("GET", "/t/1?page=4")
        .with_status(200)
        .with_body(common::forum_page(&[("Israel late", "/news/israel-4")], None))
        .expect(0)
        .create_async()
        .await;

    let config = pagination_config(format!("{}/t/1?page=1", server.url()), "israel", 3);
    let service = ScanService::new(2);
    let registry = service.registry();
    let run_id = service.start(config);

    let progress = common::wait_for_terminal(&registry, &run_id).await;
    assert_eq!(progress.status, RunStatus::Done);
    assert_eq!(progress.pages_visited, 3);
    assert_eq!(progress.links_matched, 3);
    assert!(progress.links_matched <= progress.links_seen);

    let results = registry.results(&run_id).await.unwrap();
    let texts: Vec<&str> = results.iter().map(|link| link.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Israel update one", "Israel update two", "Israel update three"]
    );

    m1.assert_async().await;
    m2.assert_async().await;
    m3.assert_async().await;
    m4.assert_async().await;
}

#[tokio::test]
async fn linear_follows_numbered_anchor_when_no_next_label_exists() {
    let mut server = mockito::Server::new_async().await;

    // Page 1 has no "next" control, only a same-path numbered anchor.
    let page_one = common::page(&format!(
        "<a href=\"{}/t/9?page=2\">2</a><a href=\"/news/israel-today\">Israel today</a>",
        server.url()
    ));
    let m1 = common::html_mock(&mut server, "/t/9?page=1", &page_one).await;
    let m2 = common::html_mock(
        &mut server,
        "/t/9?page=2",
        &common::page("<p>no further anchors</p>"),
    )
    .await;

    let config = pagination_config(format!("{}/t/9?page=1", server.url()), "israel", 5);
    let service = ScanService::new(2);
    let registry = service.registry();
    let run_id = service.start(config);

    let progress = common::wait_for_terminal(&registry, &run_id).await;
    assert_eq!(progress.status, RunStatus::Done);
    assert_eq!(progress.pages_visited, 2);
    assert_eq!(progress.links_matched, 1);

    m1.assert_async().await;
    m2.assert_async().await;
}

#[tokio::test]
async fn linear_skips_unfetchable_pages_until_streak_ends() {
    let mut server = mockito::Server::new_async().await;

    let m1 = common::html_mock(
        &mut server,
        "/s/1?page=1",
        &common::forum_page(&[("Israel opener", "/news/israel-0")], Some("/s/1?page=2")),
    )
    .await;
    // Three consecutive unfetchable pages; direct retrieval retries each
    // three times before giving up.
    let m2 = server
        .mock("GET", "/s/1?page=2")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;
    let m3 = server
        .mock("GET", "/s/1?page=3")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;
    let m4 = server
        .mock("GET", "/s/1?page=4")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let config = pagination_config(format!("{}/s/1?page=1", server.url()), "israel", 10);
    let service = ScanService::new(2);
    let registry = service.registry();
    let run_id = service.start(config);

    let progress = common::wait_for_terminal(&registry, &run_id).await;
    // Failed pages are skipped, not fatal: the streak guard ends the run.
    assert_eq!(progress.status, RunStatus::Done);
    assert_eq!(progress.pages_visited, 4);
    assert_eq!(progress.links_matched, 1);
    assert!(progress.error.is_none());

    m1.assert_async().await;
    m2.assert_async().await;
    m3.assert_async().await;
    m4.assert_async().await;
}

#[tokio::test]
async fn bfs_visits_each_url_once_within_budget() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    let root = common::page(
        "<a href=\"/a\">topic a</a>\
         <a href=\"/b\">topic b</a>\
         <a href=\"/a\">topic a again</a>\
         <a href=\"/c\">topic c</a>\
         <a href=\"http://external.invalid/x\">topic elsewhere</a>",
    );
    let m_root = common::html_mock(&mut server, "/", &root).await;
    // /a links back to the root and to /b; neither may be refetched.
    let m_a = common::html_mock(
        &mut server,
        "/a",
        &common::page(&format!("<a href=\"{base}/\">home</a><a href=\"/b\">topic b</a>")),
    )
    .await;
    let m_b = common::html_mock(&mut server, "/b", &common::page("<p>leaf</p>")).await;
    let m_c = server
        .mock("GET", "/c")
        .with_status(200)
        .with_body(common::page("<p>past the budget</p>"))
        .expect(0)
        .create_async()
        .await;

    let config = crawl_config(format!("{base}/"), "topic", 3, 2);
    let service = ScanService::new(2);
    let registry = service.registry();
    let run_id = service.start(config);

    let progress = common::wait_for_terminal(&registry, &run_id).await;
    assert_eq!(progress.status, RunStatus::Done);
    assert_eq!(progress.pages_visited, 3);

    // Distinct fetched URLs never exceed the budget, and nothing is
    // fetched twice.
    m_root.assert_async().await;
    m_a.assert_async().await;
    m_b.assert_async().await;
    m_c.assert_async().await;
}

#[tokio::test]
async fn bfs_skips_paths_disallowed_by_robots() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    let m_robots = server
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body("User-agent: *\nDisallow: /private\n")
        .create_async()
        .await;
    let root = common::page(
        "<a href=\"/private/x\">secret topic</a><a href=\"/public/y\">open topic</a>",
    );
    let m_root = common::html_mock(&mut server, "/", &root).await;
    let m_public = common::html_mock(&mut server, "/public/y", &common::page("<p>ok</p>")).await;
    let m_private = server
        .mock("GET", "/private/x")
        .with_status(200)
        .with_body(common::page("<p>must not be fetched</p>"))
        .expect(0)
        .create_async()
        .await;

    let config = crawl_config(format!("{base}/"), "topic", 10, 2);
    let service = ScanService::new(2);
    let registry = service.registry();
    let run_id = service.start(config);

    let progress = common::wait_for_terminal(&registry, &run_id).await;
    assert_eq!(progress.status, RunStatus::Done);
    // Root and /public/y only; robots.txt keeps /private/x off the fetch
    // sequence even though its link still appears in the match list.
    assert_eq!(progress.pages_visited, 2);
    assert_eq!(progress.links_matched, 2);

    m_robots.assert_async().await;
    m_root.assert_async().await;
    m_public.assert_async().await;
    m_private.assert_async().await;
}

#[tokio::test]
async fn invalid_start_url_reaches_error_through_running() {
    // Bypassing the builder leaves URL validation to the worker, which must
    // record a fatal instead of panicking, passing through `running`.
    let config = ScanConfig {
        start_url: "not a url at all".to_string(),
        keyword: "news".to_string(),
        refine: None,
        match_text: true,
        match_url: true,
        same_domain_only: false,
        backend: Backend::Direct,
        max_pages: 1,
        pause_ms: 0,
        mode: TraversalMode::Pagination,
        referer: None,
        cookies: None,
        fetch_timeout_ms: None,
    };

    let service = ScanService::new(2);
    let registry = service.registry();
    let run_id = service.start(config);

    let progress = common::wait_for_terminal(&registry, &run_id).await;
    assert_eq!(progress.status, RunStatus::Error);
    let message = progress.error.expect("fatal runs carry a message");
    assert!(message.contains("failed to parse"), "unexpected message: {message}");
}

#[tokio::test]
async fn refinement_narrows_linear_matches() {
    let mut server = mockito::Server::new_async().await;

    let body = common::forum_page(
        &[
            ("jewish israel daily", "/news/1"),
            ("jewish weekly", "/news/2"),
            ("israel sports", "/news/3"),
        ],
        None,
    );
    let m1 = common::html_mock(&mut server, "/t/2?page=1", &body).await;

    let config = ScanConfig::builder(format!("{}/t/2?page=1", server.url()), "news")
        .backend(Backend::Direct)
        .refine("jewish + israel")
        .match_url(true)
        .max_pages(1)
        .pause_ms(0)
        .build()
        .unwrap();

    let service = ScanService::new(2);
    let registry = service.registry();
    let run_id = service.start(config);

    let progress = common::wait_for_terminal(&registry, &run_id).await;
    assert_eq!(progress.status, RunStatus::Done);

    let results = registry.results(&run_id).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "jewish israel daily");

    m1.assert_async().await;
}
