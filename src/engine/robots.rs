//! Best-effort robots.txt policy for breadth-first crawls.
//!
//! The file is fetched once per run. Any failure to fetch or read it
//! disables enforcement for the run instead of aborting it.

use std::time::Duration;

use log::debug;
use robotstxt::DefaultMatcher;
use url::Url;

const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Wildcard-agent allow/deny rules for one origin.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    /// Raw robots.txt body; `None` disables enforcement.
    rules: Option<String>,
}

impl RobotsPolicy {
    /// Policy that allows everything.
    #[must_use]
    pub fn allow_all() -> Self {
        Self { rules: None }
    }

    /// Policy backed by a robots.txt body.
    #[must_use]
    pub fn from_rules(body: impl Into<String>) -> Self {
        Self {
            rules: Some(body.into()),
        }
    }

    /// Fetch `/robots.txt` for the origin of `start`. Best effort: any
    /// failure yields an allow-all policy.
    pub async fn load(start: &Url) -> Self {
        let Ok(robots_url) = start.join("/robots.txt") else {
            return Self::allow_all();
        };
        let client = match reqwest::Client::builder().timeout(ROBOTS_TIMEOUT).build() {
            Ok(client) => client,
            Err(err) => {
                debug!("robots.txt client build failed: {err}");
                return Self::allow_all();
            }
        };
        match client.get(robots_url.as_str()).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => Self::from_rules(body),
                Err(err) => {
                    debug!("robots.txt body read failed for {robots_url}: {err}");
                    Self::allow_all()
                }
            },
            Ok(response) => {
                debug!(
                    "robots.txt fetch for {robots_url} returned {}",
                    response.status()
                );
                Self::allow_all()
            }
            Err(err) => {
                debug!("robots.txt fetch failed for {robots_url}: {err}");
                Self::allow_all()
            }
        }
    }

    /// Whether a wildcard-agent crawler may fetch `url`.
    #[must_use]
    pub fn allows(&self, url: &str) -> bool {
        match &self.rules {
            None => true,
            Some(body) if body.is_empty() => true,
            Some(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, "*", url)
            }
        }
    }
}
