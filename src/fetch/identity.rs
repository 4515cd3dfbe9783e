//! Simulated browser identities and shared request shaping.

use rand::seq::IndexedRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";
const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
const IOS_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

/// Rotated identity pool for anti-403 shaping.
pub(crate) const USER_AGENTS: &[&str] = &[CHROME_UA, SAFARI_UA, IOS_UA];

/// Desktop Chrome identity, pinned where client-hint headers must agree.
pub(crate) const DESKTOP_CHROME_UA: &str = CHROME_UA;

/// Pick a fresh simulated identity.
pub(crate) fn random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(CHROME_UA)
}

/// Standard browser-like headers shared by the HTTP strategies.
pub(crate) fn browser_headers(user_agent: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers
}

/// Parse a raw `k=v; k2=v2` cookie string into trimmed pairs.
///
/// Entries without `=` or with an empty name are dropped.
pub(crate) fn cookie_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|part| {
            let (name, value) = part.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Normalized `Cookie` header value, if the raw string held usable pairs.
pub(crate) fn cookie_header(raw: &str) -> Option<HeaderValue> {
    let pairs = cookie_pairs(raw);
    if pairs.is_empty() {
        return None;
    }
    let joined = pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    HeaderValue::from_str(&joined).ok()
}

/// Apply referer and cookie shaping shared by the HTTP strategies.
pub(crate) fn apply_request_shaping(
    headers: &mut HeaderMap,
    referer: Option<&str>,
    cookies: Option<&str>,
) {
    if let Some(referer) = referer
        && let Ok(value) = HeaderValue::from_str(referer)
    {
        headers.insert(header::REFERER, value);
    }
    if let Some(raw) = cookies
        && let Some(value) = cookie_header(raw)
    {
        headers.insert(header::COOKIE, value);
    }
}
