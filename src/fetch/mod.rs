//! Page retrieval with layered anti-bot strategies.
//!
//! Three backends cover progressively hostile targets: plain HTTP with
//! identity rotation, an impersonation profile for challenge interstitials,
//! and a headless browser for script-gated markup. Under [`Backend::Auto`]
//! they are tried strictly in that order and the first success wins; an
//! explicit backend skips the chain. A fetch mutates no shared state.

mod bypass;
mod direct;
mod error;
pub(crate) mod identity;
mod rendered;

pub use error::FetchError;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

/// Named page-retrieval strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Try direct, then bypass, then rendered; first success wins.
    #[default]
    Auto,
    /// Plain HTTP GET with identity rotation and retries.
    Direct,
    /// Single-shot Chrome impersonation profile.
    Bypass,
    /// Headless browser rendering.
    Rendered,
}

impl Backend {
    /// Parse a user-supplied label. Unrecognized labels fall back to `Auto`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "direct" => Self::Direct,
            "bypass" => Self::Bypass,
            "rendered" => Self::Rendered,
            _ => Self::Auto,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Direct => "direct",
            Self::Bypass => "bypass",
            Self::Rendered => "rendered",
        }
    }
}

impl FromStr for Backend {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single page-retrieval request. Immutable per call.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute target URL.
    pub url: String,
    /// Referer header, if any.
    pub referer: Option<String>,
    /// Raw cookie string (`k=v; k2=v2`), if any.
    pub cookies: Option<String>,
    /// Strategy selector.
    pub backend: Backend,
    /// Deadline override; `None` uses each strategy's default.
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    /// Request with defaults: auto backend, no shaping, strategy timeouts.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referer: None,
            cookies: None,
            backend: Backend::Auto,
            timeout: None,
        }
    }
}

/// Retrieve raw markup for a request.
///
/// Auto mode short-circuits on the first strategy that succeeds; when every
/// strategy fails the returned [`FetchError::AllBackendsFailed`] carries each
/// strategy's failure detail.
pub async fn fetch(request: &FetchRequest) -> Result<String, FetchError> {
    match request.backend {
        Backend::Direct => direct::fetch_direct(request).await,
        Backend::Bypass => bypass::fetch_bypass(request).await,
        Backend::Rendered => rendered::fetch_rendered(request).await,
        Backend::Auto => {
            let mut causes = Vec::with_capacity(3);

            match direct::fetch_direct(request).await {
                Ok(markup) => return Ok(markup),
                Err(err) => {
                    debug!("direct retrieval failed for {}: {err}", request.url);
                    causes.push(format!("direct: {err}"));
                }
            }

            match bypass::fetch_bypass(request).await {
                Ok(markup) => return Ok(markup),
                Err(err) => {
                    debug!("challenge-bypass retrieval failed for {}: {err}", request.url);
                    causes.push(format!("bypass: {err}"));
                }
            }

            match rendered::fetch_rendered(request).await {
                Ok(markup) => return Ok(markup),
                Err(err) => {
                    debug!("rendered retrieval failed for {}: {err}", request.url);
                    causes.push(format!("rendered: {err}"));
                }
            }

            Err(FetchError::AllBackendsFailed { causes })
        }
    }
}
