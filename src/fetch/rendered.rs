//! Rendered retrieval through headless Chrome.
//!
//! Loads the page in a real browser engine so script-built markup and
//! challenge interstitials resolve before extraction. Cookies go through the
//! browser's cookie store; the referer rides on extra HTTP headers.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, Headers, SetCookiesParams, SetExtraHttpHeadersParams,
};
use futures::StreamExt;
use log::{debug, warn};
use tokio::task::JoinHandle;
use url::Url;

use super::FetchRequest;
use super::error::FetchError;
use super::identity::{cookie_pairs, random_user_agent};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Browser instance plus its CDP event-handler task.
///
/// The handler task must be aborted when the session ends or it would drive
/// the dead connection forever; Chrome itself is reaped by `Browser::drop`.
struct HeadlessSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl HeadlessSession {
    async fn launch(user_agent: &str) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(30))
            .window_size(1280, 800)
            .arg(format!("--user-agent={user_agent}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .build()
            .map_err(|err| FetchError::RenderFailure(format!("browser config: {err}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| FetchError::RenderFailure(format!("browser launch: {err}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!("browser handler event error: {err:?}");
                }
            }
        });

        Ok(Self {
            browser,
            handler: handler_task,
        })
    }
}

impl Drop for HeadlessSession {
    fn drop(&mut self) {
        self.handler.abort();
        // Browser::drop kills the Chrome process.
    }
}

async fn with_deadline<F, T>(operation: F, deadline: Duration, what: &str) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::RenderFailure(format!(
            "{what} timed out after {}s",
            deadline.as_secs()
        ))),
    }
}

pub(super) async fn fetch_rendered(request: &FetchRequest) -> Result<String, FetchError> {
    let deadline = request.timeout.unwrap_or(DEFAULT_TIMEOUT);
    let host = Url::parse(&request.url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));

    let session = HeadlessSession::launch(random_user_agent()).await?;

    let page = session
        .browser
        .new_page("about:blank")
        .await
        .map_err(|err| FetchError::RenderFailure(format!("page create: {err}")))?;

    if let (Some(raw), Some(host)) = (request.cookies.as_deref(), host.as_deref()) {
        let cookies: Vec<CookieParam> = cookie_pairs(raw)
            .into_iter()
            .filter_map(|(name, value)| {
                CookieParam::builder()
                    .name(name)
                    .value(value)
                    .domain(host)
                    .path("/")
                    .build()
                    .ok()
            })
            .collect();
        if !cookies.is_empty()
            && let Err(err) = page.execute(SetCookiesParams::new(cookies)).await
        {
            warn!("failed to seed browser cookies for {}: {err}", request.url);
        }
    }

    if let Some(referer) = request.referer.as_deref() {
        let headers = Headers::new(serde_json::json!({ "Referer": referer }));
        if let Err(err) = page.execute(SetExtraHttpHeadersParams::new(headers)).await {
            warn!("failed to set referer for {}: {err}", request.url);
        }
    }

    with_deadline(
        async {
            page.goto(request.url.as_str())
                .await
                .map_err(|err| FetchError::RenderFailure(format!("navigation: {err}")))?;
            page.wait_for_navigation()
                .await
                .map_err(|err| FetchError::RenderFailure(format!("navigation wait: {err}")))?;
            Ok(())
        },
        deadline,
        "navigation",
    )
    .await?;

    let markup = page
        .content()
        .await
        .map_err(|err| FetchError::RenderFailure(format!("content read: {err}")))?;

    if markup.trim().is_empty() {
        return Err(FetchError::RenderFailure(
            "rendered document is empty".to_string(),
        ));
    }
    Ok(markup)
}
