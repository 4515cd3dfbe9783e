//! Shared helpers for the engine-level test suite.

use std::sync::Arc;
use std::time::Duration;

use linkscout::{ProgressSnapshot, RunRegistry};
use mockito::{Mock, ServerGuard};
use uuid::Uuid;

/// Minimal HTML document wrapping arbitrary body markup.
#[allow(dead_code)]
pub fn page(body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>test</title></head><body>{body}</body></html>"
    )
}

/// Forum-style page: a list of topic links plus an optional rel=next anchor.
#[allow(dead_code)]
pub fn forum_page(links: &[(&str, &str)], next_href: Option<&str>) -> String {
    let mut body = String::from("<ul>");
    for (text, href) in links {
        body.push_str(&format!("<li><a href=\"{href}\">{text}</a></li>"));
    }
    body.push_str("</ul>");
    if let Some(href) = next_href {
        body.push_str(&format!("<a rel=\"next\" href=\"{href}\">Next</a>"));
    }
    page(&body)
}

/// Mock endpoint returning HTML. The path may include a query string.
#[allow(dead_code)]
pub async fn html_mock(server: &mut ServerGuard, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await
}

/// Poll the registry until the run reaches a terminal status.
///
/// Panics after ten seconds; engine tests run with a zero politeness pause,
/// so anything slower is a hang.
#[allow(dead_code)]
pub async fn wait_for_terminal(registry: &Arc<RunRegistry>, run_id: &Uuid) -> ProgressSnapshot {
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    loop {
        let progress = registry
            .progress(run_id)
            .await
            .expect("run vanished from the registry");
        if progress.status.is_terminal() {
            return progress;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "run did not finish within 10s: {progress:?}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
