//! Crawl orchestration.
//!
//! Each accepted run executes as one background task that pulls pages through
//! the fetch chain, extracts and filters links, and writes progress into the
//! registry through its handle. A service-wide semaphore caps how many runs
//! execute simultaneously; runs past the cap stay `queued` until a permit
//! frees up.

mod bfs;
mod linear;
mod robots;

pub use robots::RobotsPolicy;

use std::sync::Arc;

use log::{error, info};
use tokio::sync::Semaphore;
use url::Url;
use uuid::Uuid;

use crate::config::{ScanConfig, TraversalMode};
use crate::registry::{RunHandle, RunMeta, RunRegistry};

/// Default cap on simultaneously executing runs.
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 4;

/// An error in control logic itself, outside the per-page fetch path.
///
/// Drives the run's status to `error`; partial results are retained. A
/// single page's fetch failure is never fatal.
#[derive(Debug, thiserror::Error)]
pub enum CrawlFatal {
    #[error("start URL {url:?} failed to parse: {source}")]
    InvalidStartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

pub(crate) fn parse_start(url: &str) -> Result<Url, CrawlFatal> {
    Url::parse(url).map_err(|source| CrawlFatal::InvalidStartUrl {
        url: url.to_string(),
        source,
    })
}

/// Spawns and tracks crawl runs.
#[derive(Clone)]
pub struct ScanService {
    registry: Arc<RunRegistry>,
    permits: Arc<Semaphore>,
}

impl ScanService {
    #[must_use]
    pub fn new(max_concurrent_runs: usize) -> Self {
        Self::with_registry(Arc::new(RunRegistry::new()), max_concurrent_runs)
    }

    /// Service sharing an existing registry.
    #[must_use]
    pub fn with_registry(registry: Arc<RunRegistry>, max_concurrent_runs: usize) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
        }
    }

    /// Shared registry for progress polls and result reads.
    #[must_use]
    pub fn registry(&self) -> Arc<RunRegistry> {
        Arc::clone(&self.registry)
    }

    /// Register a run and spawn its background task.
    ///
    /// Returns the opaque run id immediately. The run starts `queued`,
    /// reaches a terminal status on its own, and cannot be aborted
    /// externally; callers observe it through the registry.
    pub fn start(&self, config: ScanConfig) -> Uuid {
        let (run_id, handle) = self.registry.create(RunMeta::from(&config));
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // Semaphore closed: the service was torn down mid-queue.
                    handle.mark_running().await;
                    handle
                        .fail("run scheduler shut down before start".to_string())
                        .await;
                    return;
                }
            };
            run_to_completion(handle, config).await;
        });

        info!("run {run_id} registered");
        run_id
    }
}

async fn run_to_completion(handle: RunHandle, config: ScanConfig) {
    // Running covers the whole traversal, including failures before the
    // first fetch, so polls never see queued jump straight to a terminal.
    handle.mark_running().await;

    let outcome = match config.mode {
        TraversalMode::Pagination => linear::run(&handle, &config).await,
        TraversalMode::SameSite { max_depth } => bfs::run(&handle, &config, max_depth).await,
    };

    match outcome {
        Ok(()) => handle.mark_done().await,
        Err(fatal) => {
            error!("run {} failed: {fatal}", handle.id());
            handle.fail(fatal.to_string()).await;
        }
    }
}
