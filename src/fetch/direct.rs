//! Direct HTTP retrieval with identity rotation.

use std::time::Duration;

use log::debug;
use reqwest::StatusCode;

use super::FetchRequest;
use super::error::FetchError;
use super::identity::{apply_request_shaping, browser_headers, random_user_agent};

/// Attempts before the strategy reports failure. Each attempt picks a new
/// simulated identity.
const MAX_ATTEMPTS: u32 = 3;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

pub(super) async fn fetch_direct(request: &FetchRequest) -> Result<String, FetchError> {
    let timeout = request.timeout.unwrap_or(DEFAULT_TIMEOUT);
    let mut errors: Vec<String> = Vec::new();
    let mut blocked = false;

    for attempt in 1..=MAX_ATTEMPTS {
        let mut headers = browser_headers(random_user_agent());
        apply_request_shaping(
            &mut headers,
            request.referer.as_deref(),
            request.cookies.as_deref(),
        );

        let client = match reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                errors.push(format!("client build failed on attempt {attempt}: {err}"));
                continue;
            }
        };

        match client.get(&request.url).send().await {
            Ok(response) if response.status() == StatusCode::FORBIDDEN => {
                blocked = true;
                errors.push(format!("HTTP 403 on attempt {attempt}"));
            }
            Ok(response) => match response.error_for_status() {
                Ok(response) => match response.text().await {
                    Ok(markup) => return Ok(markup),
                    Err(err) => errors.push(format!("body read failed on attempt {attempt}: {err}")),
                },
                Err(err) => errors.push(format!("attempt {attempt}: {err}")),
            },
            Err(err) => errors.push(format!("attempt {attempt}: {err}")),
        }

        debug!(
            "direct retrieval attempt {attempt}/{MAX_ATTEMPTS} failed for {}",
            request.url
        );
    }

    let detail = errors.join("; ");
    if blocked {
        Err(FetchError::Blocked(detail))
    } else {
        Err(FetchError::Transient(detail))
    }
}
