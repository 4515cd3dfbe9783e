//! Anchor extraction.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

/// One discovered hyperlink.
///
/// Identity for deduplication is the URL alone; the first-seen text wins.
/// That rule is enforced where records are accumulated, not by `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Trimmed anchor text, possibly empty.
    pub text: String,
    /// Absolute URL with the fragment stripped.
    pub url: String,
}

/// Collect every `(text, url)` pair from the anchor elements in `markup`.
///
/// Hrefs are resolved against `base` with standard URI-reference resolution
/// (scheme-relative and path-relative forms included); anchors whose href
/// cannot be resolved are skipped. Non-anchor references (scripts, styles)
/// are ignored. Malformed markup parses permissively; the worst case is an
/// empty list.
pub fn extract_links(markup: &str, base: &Url) -> Vec<LinkRecord> {
    let document = Html::parse_document(markup);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let mut resolved = base.join(href).ok()?;
            resolved.set_fragment(None);
            let text = anchor.text().collect::<String>().trim().to_string();
            Some(LinkRecord {
                text,
                url: resolved.to_string(),
            })
        })
        .collect()
}
