//! Run configuration with validation.
//!
//! A [`ScanConfig`] captures everything a single run needs: the start URL and
//! keyword, the traversal mode, the retrieval backend, budgets, and request
//! shaping overrides. Build one through [`ScanConfig::builder`]; `build()`
//! rejects malformed input before a run entry is ever created.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::Backend;

/// Hard safety cap on the page budget of a single run.
pub const MAX_PAGE_BUDGET: usize = 5000;

/// Default politeness pause between fetches.
pub const DEFAULT_PAUSE_MS: u64 = 400;

/// How a run walks the target site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TraversalMode {
    /// Follow one "next page" link per step, bounded by the page budget.
    Pagination,
    /// Breadth-first over every discovered same-site link, bounded by the
    /// page budget and `max_depth`.
    SameSite { max_depth: u32 },
}

/// Rejected run parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The start URL did not parse as an absolute URL.
    #[error("start URL {url:?} is not a valid absolute URL: {source}")]
    InvalidStartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The start URL parsed but is not fetchable (scheme or host missing).
    #[error("start URL {0:?} must use http or https and include a host")]
    UnsupportedStartUrl(String),

    /// The primary keyword was empty after trimming.
    #[error("keyword must not be empty")]
    EmptyKeyword,
}

/// Validated parameters for one crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Absolute http(s) start URL.
    pub start_url: String,
    /// Primary keyword, matched case-insensitively.
    pub keyword: String,
    /// Optional refinement expression (comma = OR, plus = AND).
    pub refine: Option<String>,
    /// Match the keyword against anchor text.
    pub match_text: bool,
    /// Match the keyword against the link URL.
    pub match_url: bool,
    /// Drop links whose host differs from the start URL's host.
    pub same_domain_only: bool,
    /// Retrieval strategy selector.
    pub backend: Backend,
    /// Maximum distinct pages fetched by the run.
    pub max_pages: usize,
    /// Politeness pause between fetches, in milliseconds.
    pub pause_ms: u64,
    /// Linear pagination following or breadth-first site walking.
    pub mode: TraversalMode,
    /// Referer override for every fetch in the run.
    pub referer: Option<String>,
    /// Raw cookie string ("k=v; k2=v2") applied to every fetch.
    pub cookies: Option<String>,
    /// Overrides the per-strategy fetch timeouts when set.
    pub fetch_timeout_ms: Option<u64>,
}

impl ScanConfig {
    /// Start building a configuration from the two required inputs.
    pub fn builder(start_url: impl Into<String>, keyword: impl Into<String>) -> ScanConfigBuilder {
        ScanConfigBuilder::new(start_url.into(), keyword.into())
    }

    /// Politeness pause as a duration.
    #[must_use]
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    /// Fetch timeout override, if configured.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    start_url: String,
    keyword: String,
    refine: Option<String>,
    match_text: bool,
    match_url: bool,
    same_domain_only: bool,
    backend: Backend,
    max_pages: usize,
    pause_ms: u64,
    mode: TraversalMode,
    referer: Option<String>,
    cookies: Option<String>,
    fetch_timeout_ms: Option<u64>,
}

impl ScanConfigBuilder {
    fn new(start_url: String, keyword: String) -> Self {
        Self {
            start_url,
            keyword,
            refine: None,
            match_text: true,
            match_url: true,
            same_domain_only: false,
            backend: Backend::Auto,
            max_pages: 1,
            pause_ms: DEFAULT_PAUSE_MS,
            mode: TraversalMode::Pagination,
            referer: None,
            cookies: None,
            fetch_timeout_ms: None,
        }
    }

    #[must_use]
    pub fn refine(mut self, expression: impl Into<String>) -> Self {
        self.refine = Some(expression.into());
        self
    }

    #[must_use]
    pub fn match_text(mut self, enabled: bool) -> Self {
        self.match_text = enabled;
        self
    }

    #[must_use]
    pub fn match_url(mut self, enabled: bool) -> Self {
        self.match_url = enabled;
        self
    }

    #[must_use]
    pub fn same_domain_only(mut self, enabled: bool) -> Self {
        self.same_domain_only = enabled;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    #[must_use]
    pub fn pause_ms(mut self, pause_ms: u64) -> Self {
        self.pause_ms = pause_ms;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: TraversalMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    #[must_use]
    pub fn fetch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.fetch_timeout_ms = Some(timeout_ms);
        self
    }

    /// Validate and produce the configuration.
    ///
    /// The page budget is clamped to `1..=MAX_PAGE_BUDGET`; blank optional
    /// strings are normalized to `None`.
    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        let url = Url::parse(&self.start_url).map_err(|source| ConfigError::InvalidStartUrl {
            url: self.start_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::UnsupportedStartUrl(self.start_url));
        }

        let keyword = self.keyword.trim().to_string();
        if keyword.is_empty() {
            return Err(ConfigError::EmptyKeyword);
        }

        let refine = self
            .refine
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let referer = self.referer.filter(|r| !r.trim().is_empty());
        let cookies = self.cookies.filter(|c| !c.trim().is_empty());

        Ok(ScanConfig {
            start_url: self.start_url,
            keyword,
            refine,
            match_text: self.match_text,
            match_url: self.match_url,
            same_domain_only: self.same_domain_only,
            backend: self.backend,
            max_pages: self.max_pages.clamp(1, MAX_PAGE_BUDGET),
            pause_ms: self.pause_ms,
            mode: self.mode,
            referer,
            cookies,
            fetch_timeout_ms: self.fetch_timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_applies_defaults() {
        let config = ScanConfig::builder("https://forum.example/t/1", "israel")
            .build()
            .unwrap();
        assert_eq!(config.max_pages, 1);
        assert_eq!(config.pause_ms, DEFAULT_PAUSE_MS);
        assert!(config.match_text && config.match_url);
        assert!(!config.same_domain_only);
        assert_eq!(config.backend, Backend::Auto);
        assert_eq!(config.mode, TraversalMode::Pagination);
    }

    #[test]
    fn build_rejects_relative_url() {
        let err = ScanConfig::builder("/t/1?page=1", "news").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStartUrl { .. }));
    }

    #[test]
    fn build_rejects_non_http_scheme() {
        let err = ScanConfig::builder("ftp://forum.example/t/1", "news")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedStartUrl(_)));
    }

    #[test]
    fn build_rejects_blank_keyword() {
        let err = ScanConfig::builder("https://forum.example/", "   ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyKeyword));
    }

    #[test]
    fn build_clamps_page_budget() {
        let config = ScanConfig::builder("https://forum.example/", "news")
            .max_pages(0)
            .build()
            .unwrap();
        assert_eq!(config.max_pages, 1);

        let config = ScanConfig::builder("https://forum.example/", "news")
            .max_pages(1_000_000)
            .build()
            .unwrap();
        assert_eq!(config.max_pages, MAX_PAGE_BUDGET);
    }

    #[test]
    fn build_normalizes_blank_optionals() {
        let config = ScanConfig::builder("https://forum.example/", "news")
            .refine("  ")
            .referer("")
            .cookies("  ")
            .build()
            .unwrap();
        assert!(config.refine.is_none());
        assert!(config.referer.is_none());
        assert!(config.cookies.is_none());
    }
}
