//! Next-page resolution for query-string and forum-style pagination.
//!
//! Heuristics run in priority order: an explicit `rel=next` anchor, a "next"
//! class token, localized "next" labels, a same-path anchor numbered
//! current+1, and finally synthesis from a learned query template. The
//! resolver is a pure function of (markup, URL); termination guards (repeat
//! candidate, visited set, empty-page streak) belong to the caller.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;
use url::form_urlencoded;

/// Query parameter carrying the page number on most forum software.
const PAGE_PARAM: &str = "page";

/// Anchor labels meaning "next page" across locales and arrow glyphs,
/// checked in this order.
const NEXT_LABELS: &[&str] = &["Next", "next", "下一页", "›", ">"];

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

/// Ordered query pairs learned from a same-path anchor that carries a page
/// parameter, blank values preserved. Recomputed per page and used to
/// synthesize a next-page URL matching the site's expected query shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationTemplate {
    pairs: Vec<(String, String)>,
}

impl PaginationTemplate {
    /// Learn a template from any same-path anchor carrying a page parameter.
    #[must_use]
    pub fn learn(markup: &str, current: &Url) -> Option<Self> {
        let document = Html::parse_document(markup);
        template_from_document(&document, current)
    }
}

/// Resolve the URL of the logical next page, if any heuristic applies.
#[must_use]
pub fn resolve_next(markup: &str, current: &Url) -> Option<Url> {
    let document = Html::parse_document(markup);
    rel_next(&document, current)
        .or_else(|| class_next(&document, current))
        .or_else(|| labeled_next(&document, current))
        .or_else(|| numbered_next(&document, current))
        .or_else(|| {
            template_from_document(&document, current)
                .map(|template| bump_page(current, Some(&template)))
        })
}

/// Build a next-page URL by incrementing the page parameter.
///
/// Follows the template's parameter order when one is supplied, otherwise the
/// current URL's own query order. Values come from the current URL where
/// present, falling back to template defaults; blank values stay blank; extra
/// current-URL parameters are appended after the template's. Always produces
/// a candidate, appending `page=N+1` when the parameter is absent everywhere.
#[must_use]
pub fn bump_page(current: &Url, template: Option<&PaginationTemplate>) -> Url {
    let cur_pairs: Vec<(String, String)> = query_pairs(current);
    let cur_map: HashMap<&str, &str> = cur_pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let next_page = (current_page_number(current) + 1).to_string();
    let followed: &[(String, String)] = match template {
        Some(template) => &template.pairs,
        None => &cur_pairs,
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut out: Vec<(&str, &str)> = Vec::new();
    let mut inserted_page = false;

    for (key, template_value) in followed {
        if !seen.insert(key.as_str()) {
            continue;
        }
        if key == PAGE_PARAM {
            out.push((key, next_page.as_str()));
            inserted_page = true;
        } else {
            out.push((key, cur_map.get(key.as_str()).copied().unwrap_or(template_value)));
        }
    }

    // Current-URL parameters the template never mentioned, original order.
    for (key, value) in &cur_pairs {
        if key != PAGE_PARAM && seen.insert(key.as_str()) {
            out.push((key, value));
        }
    }

    if !inserted_page {
        out.push((PAGE_PARAM, next_page.as_str()));
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(out)
        .finish();
    let mut next = current.clone();
    next.set_query(Some(&query));
    next
}

fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Current page number; defaults to 1 when absent, blank, or unparsable.
fn current_page_number(url: &Url) -> i64 {
    url.query_pairs()
        .filter(|(key, _)| key == PAGE_PARAM)
        .last()
        .and_then(|(_, value)| value.parse::<i64>().ok())
        .unwrap_or(1)
}

fn same_path(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path() == b.path()
}

fn resolve_href(anchor: ElementRef<'_>, current: &Url) -> Option<Url> {
    let href = anchor.value().attr("href")?.trim();
    current.join(href).ok()
}

fn rel_next(document: &Html, current: &Url) -> Option<Url> {
    document.select(&ANCHOR_SELECTOR).find_map(|anchor| {
        let rel = anchor.value().attr("rel")?;
        if rel.to_ascii_lowercase().contains("next") {
            resolve_href(anchor, current)
        } else {
            None
        }
    })
}

fn class_next(document: &Html, current: &Url) -> Option<Url> {
    document.select(&ANCHOR_SELECTOR).find_map(|anchor| {
        if anchor.value().classes().any(|class| class.contains("nxt")) {
            resolve_href(anchor, current)
        } else {
            None
        }
    })
}

fn labeled_next(document: &Html, current: &Url) -> Option<Url> {
    for label in NEXT_LABELS {
        for anchor in document.select(&ANCHOR_SELECTOR) {
            let text = anchor.text().collect::<String>();
            if text.contains(label)
                && let Some(url) = resolve_href(anchor, current)
            {
                return Some(url);
            }
        }
    }
    None
}

/// Same-path anchor whose page parameter equals current + 1. Covers sites
/// where page 1 has no explicit "next" control but numbered anchors exist.
fn numbered_next(document: &Html, current: &Url) -> Option<Url> {
    let target = current_page_number(current) + 1;
    document.select(&ANCHOR_SELECTOR).find_map(|anchor| {
        let candidate = resolve_href(anchor, current)?;
        if !same_path(current, &candidate) {
            return None;
        }
        let page = candidate
            .query_pairs()
            .filter(|(key, _)| key == PAGE_PARAM)
            .last()
            .and_then(|(_, value)| value.parse::<i64>().ok())?;
        (page == target).then_some(candidate)
    })
}

fn template_from_document(document: &Html, current: &Url) -> Option<PaginationTemplate> {
    document.select(&ANCHOR_SELECTOR).find_map(|anchor| {
        let candidate = resolve_href(anchor, current)?;
        if !same_path(current, &candidate) {
            return None;
        }
        let pairs = query_pairs(&candidate);
        pairs
            .iter()
            .any(|(key, _)| key == PAGE_PARAM)
            .then_some(PaginationTemplate { pairs })
    })
}
