//! Keyword matching and refinement over extracted links.

use std::collections::HashSet;

use url::Url;

use crate::extract::LinkRecord;

/// Case-insensitive primary keyword match over text and/or URL.
///
/// With `same_domain_only`, links on a different host than `base` are dropped
/// before matching. Output is deduplicated by URL, first-seen order and text
/// preserved.
#[must_use]
pub fn primary_match(
    links: &[LinkRecord],
    keyword: &str,
    match_text: bool,
    match_url: bool,
    same_domain_only: bool,
    base: &Url,
) -> Vec<LinkRecord> {
    let keyword = keyword.to_lowercase();
    let base_host =
        same_domain_only.then(|| base.host_str().unwrap_or_default().to_lowercase());

    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for link in links {
        if let Some(base_host) = &base_host {
            let host = Url::parse(&link.url)
                .ok()
                .and_then(|url| url.host_str().map(str::to_lowercase))
                .unwrap_or_default();
            if host != *base_host {
                continue;
            }
        }
        let text_hit = match_text && link.text.to_lowercase().contains(&keyword);
        let url_hit = match_url && link.url.to_lowercase().contains(&keyword);
        if (text_hit || url_hit) && seen.insert(link.url.as_str()) {
            out.push(link.clone());
        }
    }
    out
}

/// Narrow an already-matched set with an AND/OR term expression.
///
/// The expression splits on `,` and `+`. A `+` with no `,` makes every term
/// required (AND); otherwise any single term suffices (OR). Terms are
/// trimmed and lowercased, empties dropped. An empty expression, or one with
/// no usable terms, passes everything through.
#[must_use]
pub fn refine(
    links: &[LinkRecord],
    expression: &str,
    match_text: bool,
    match_url: bool,
) -> Vec<LinkRecord> {
    if expression.trim().is_empty() {
        return links.to_vec();
    }
    let require_all = expression.contains('+') && !expression.contains(',');
    let terms: Vec<String> = expression
        .split(['+', ','])
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect();
    if terms.is_empty() {
        return links.to_vec();
    }

    let hit = |field: &str| {
        let field = field.to_lowercase();
        if require_all {
            terms.iter().all(|term| field.contains(term))
        } else {
            terms.iter().any(|term| field.contains(term))
        }
    };

    links
        .iter()
        .filter(|link| (match_text && hit(&link.text)) || (match_url && hit(&link.url)))
        .cloned()
        .collect()
}
