//! Pagination-follow traversal: one forward chain of "next page" hops.

use std::collections::HashSet;

use log::debug;
use url::Url;

use super::{CrawlFatal, parse_start};
use crate::config::ScanConfig;
use crate::extract;
use crate::fetch::{self, FetchRequest};
use crate::filter;
use crate::pagination;
use crate::registry::RunHandle;

/// Consecutive unfetchable pages tolerated before the run ends.
const MAX_EMPTY_STREAK: u32 = 2;

pub(super) async fn run(handle: &RunHandle, config: &ScanConfig) -> Result<(), CrawlFatal> {
    let start = parse_start(&config.start_url)?;
    handle.set_page_budget(config.max_pages).await;

    // Polite first-hop referer: the start URL's own directory when the
    // caller supplied none.
    let default_referer = origin_referer(&start);

    let mut visited: HashSet<String> = HashSet::new();
    let mut matched_urls: HashSet<String> = HashSet::new();
    let mut current = start.clone();
    let mut empty_streak: u32 = 0;

    for _ in 0..config.max_pages {
        if visited.contains(current.as_str()) {
            break;
        }
        visited.insert(current.to_string());
        handle
            .record_visit(
                visited.len(),
                config.max_pages.saturating_sub(visited.len()),
            )
            .await;

        let request = FetchRequest {
            url: current.to_string(),
            referer: config.referer.clone().or_else(|| default_referer.clone()),
            cookies: config.cookies.clone(),
            backend: config.backend,
            timeout: config.fetch_timeout(),
        };

        let next = match fetch::fetch(&request).await {
            Ok(markup) => {
                empty_streak = 0;

                let links = extract::extract_links(&markup, &current);
                let mut matches = filter::primary_match(
                    &links,
                    &config.keyword,
                    config.match_text,
                    config.match_url,
                    config.same_domain_only,
                    &start,
                );
                if let Some(expression) = &config.refine {
                    matches =
                        filter::refine(&matches, expression, config.match_text, config.match_url);
                }
                matches.retain(|link| matched_urls.insert(link.url.clone()));

                handle
                    .record_page(
                        visited.len(),
                        config.max_pages.saturating_sub(visited.len()),
                        links.len(),
                        matches,
                    )
                    .await;

                pagination::resolve_next(&markup, &current)
            }
            Err(err) => {
                // One page failing never aborts the run; it just shortens it.
                debug!("page skipped, fetch failed for {current}: {err}");
                empty_streak += 1;
                if empty_streak > MAX_EMPTY_STREAK {
                    break;
                }
                Some(pagination::bump_page(&current, None))
            }
        };

        let Some(next) = next else { break };
        if next == current || visited.contains(next.as_str()) {
            break;
        }
        current = next;

        if config.pause_ms > 0 {
            tokio::time::sleep(config.pause()).await;
        }
    }

    Ok(())
}

fn origin_referer(start: &Url) -> Option<String> {
    start.join("./").ok().map(|url| url.to_string())
}
