//! Breadth-first same-site traversal.
//!
//! A FIFO frontier of (URL, depth) pairs seeded with the start URL; a
//! visited set guards against refetching. Pages are processed in level
//! order with insertion-order ties within a level.

use std::collections::{HashSet, VecDeque};

use log::debug;
use url::Url;

use super::robots::RobotsPolicy;
use super::{CrawlFatal, parse_start};
use crate::config::ScanConfig;
use crate::extract;
use crate::fetch::{self, FetchRequest};
use crate::filter;
use crate::registry::RunHandle;

pub(super) async fn run(
    handle: &RunHandle,
    config: &ScanConfig,
    max_depth: u32,
) -> Result<(), CrawlFatal> {
    let start = parse_start(&config.start_url)?;
    handle.set_page_budget(config.max_pages).await;

    // Fetched once per run; unreadable rules degrade to allow-all.
    let robots = RobotsPolicy::load(&start).await;

    let mut frontier: VecDeque<(String, u32)> = VecDeque::new();
    frontier.push_back((start.to_string(), 0));
    let mut visited: HashSet<String> = HashSet::new();
    let mut matched_urls: HashSet<String> = HashSet::new();

    while visited.len() < config.max_pages {
        let Some((url, depth)) = frontier.pop_front() else {
            break;
        };
        if visited.contains(&url) {
            continue;
        }
        if config.same_domain_only && !same_host(&start, &url) {
            continue;
        }
        if !robots.allows(&url) {
            debug!("robots.txt disallows {url}, skipping");
            continue;
        }
        let Ok(page_url) = Url::parse(&url) else {
            continue;
        };

        visited.insert(url.clone());
        handle.record_visit(visited.len(), frontier.len()).await;

        let request = FetchRequest {
            url: url.clone(),
            referer: config.referer.clone(),
            cookies: config.cookies.clone(),
            backend: config.backend,
            timeout: config.fetch_timeout(),
        };
        let markup = match fetch::fetch(&request).await {
            Ok(markup) => markup,
            Err(err) => {
                // No links discovered here; the frontier carries on.
                debug!("page skipped, fetch failed for {url}: {err}");
                continue;
            }
        };

        let links = extract::extract_links(&markup, &page_url);

        // The domain gate governs traversal; matches themselves may point
        // off-site, as in linear mode with the flag unset.
        let mut matches = filter::primary_match(
            &links,
            &config.keyword,
            config.match_text,
            config.match_url,
            false,
            &start,
        );
        if let Some(expression) = &config.refine {
            matches = filter::refine(&matches, expression, config.match_text, config.match_url);
        }
        matches.retain(|link| matched_urls.insert(link.url.clone()));

        if depth < max_depth {
            for link in &links {
                if !is_crawlable(&link.url) {
                    continue;
                }
                if config.same_domain_only && !same_host(&start, &link.url) {
                    continue;
                }
                if !visited.contains(&link.url) {
                    frontier.push_back((link.url.clone(), depth + 1));
                }
            }
        }

        handle
            .record_page(visited.len(), frontier.len(), links.len(), matches)
            .await;

        if config.pause_ms > 0 {
            tokio::time::sleep(config.pause()).await;
        }
    }

    Ok(())
}

fn same_host(start: &Url, candidate: &str) -> bool {
    let Ok(candidate) = Url::parse(candidate) else {
        return false;
    };
    let start_host = start.host_str().unwrap_or_default().to_ascii_lowercase();
    let candidate_host = candidate.host_str().unwrap_or_default().to_ascii_lowercase();
    start_host == candidate_host
}

/// Only http(s) URLs belong on the frontier.
fn is_crawlable(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
