//! Command-line front end: start one run, poll its progress, print matches.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use linkscout::{
    Backend, DEFAULT_MAX_CONCURRENT_RUNS, ScanConfig, ScanService, TraversalMode,
};

#[derive(Parser, Debug)]
#[command(
    name = "linkscout",
    version,
    about = "Discover and filter links across paginated or same-site pages"
)]
struct Cli {
    /// Absolute start URL, including scheme and host.
    url: String,

    /// Primary keyword matched against link text and/or URL.
    keyword: String,

    /// Refinement expression: comma separates OR terms, plus separates AND terms.
    #[arg(long)]
    refine: Option<String>,

    /// Breadth-first same-site crawl instead of pagination following.
    #[arg(long)]
    crawl: bool,

    /// Maximum link depth for --crawl.
    #[arg(long, default_value_t = 4)]
    max_depth: u32,

    /// Page budget for the run (default: 1, or 500 with --crawl).
    #[arg(long)]
    max_pages: Option<usize>,

    /// Politeness pause between fetches, in milliseconds.
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Retrieval backend: auto, direct, bypass, or rendered.
    #[arg(long, default_value = "auto")]
    backend: Backend,

    /// Skip matching on link text.
    #[arg(long)]
    no_text: bool,

    /// Skip matching on link URLs.
    #[arg(long)]
    no_url: bool,

    /// Drop links whose host differs from the start URL's (pagination mode).
    #[arg(long)]
    same_domain: bool,

    /// Follow links onto other hosts with --crawl.
    #[arg(long)]
    allow_external: bool,

    /// Referer header override.
    #[arg(long)]
    referer: Option<String>,

    /// Raw cookie string ("k=v; k2=v2").
    #[arg(long)]
    cookies: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mode = if cli.crawl {
        TraversalMode::SameSite {
            max_depth: cli.max_depth,
        }
    } else {
        TraversalMode::Pagination
    };
    let default_pages = if cli.crawl { 500 } else { 1 };
    let default_pause = if cli.crawl { 300 } else { 400 };
    let same_domain_only = if cli.crawl {
        !cli.allow_external
    } else {
        cli.same_domain
    };

    let mut builder = ScanConfig::builder(&cli.url, &cli.keyword)
        .mode(mode)
        .backend(cli.backend)
        .max_pages(cli.max_pages.unwrap_or(default_pages))
        .pause_ms(cli.pause_ms.unwrap_or(default_pause))
        .match_text(!cli.no_text)
        .match_url(!cli.no_url)
        .same_domain_only(same_domain_only);
    if let Some(refine) = cli.refine {
        builder = builder.refine(refine);
    }
    if let Some(referer) = cli.referer {
        builder = builder.referer(referer);
    }
    if let Some(cookies) = cli.cookies {
        builder = builder.cookies(cookies);
    }
    let config = builder.build()?;

    let service = ScanService::new(DEFAULT_MAX_CONCURRENT_RUNS);
    let registry = service.registry();
    let run_id = service.start(config);

    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let Some(progress) = registry.progress(&run_id).await else {
            anyhow::bail!("run {run_id} disappeared from the registry");
        };
        let eta = progress
            .eta_seconds
            .map(|secs| format!(" eta={secs}s"))
            .unwrap_or_default();
        eprintln!(
            "[{run_id}] {:?} visited={} queued={} seen={} matched={}{eta}",
            progress.status,
            progress.pages_visited,
            progress.pages_queued,
            progress.links_seen,
            progress.links_matched,
        );
        if progress.status.is_terminal() {
            if let Some(error) = progress.error {
                anyhow::bail!("run failed: {error}");
            }
            break;
        }
    }

    if let Some(results) = registry.results(&run_id).await {
        for link in results {
            let label = if link.text.is_empty() {
                link.url.as_str()
            } else {
                link.text.as_str()
            };
            println!("{label}\t{}", link.url);
        }
    }
    Ok(())
}
