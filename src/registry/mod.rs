//! Concurrent run registry.
//!
//! Maps opaque run ids to mutable run state. Exactly one writer per entry
//! (the crawl task, through its [`RunHandle`]) and arbitrarily many readers
//! (status polls, result reads) across any number of simultaneously active
//! runs. The map is lock-free for lookups; each entry carries its own
//! `RwLock` so a poll never observes a torn update.

mod types;

pub use types::{ProgressSnapshot, RunManifest, RunMeta, RunState, RunStatus};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::extract::LinkRecord;

/// Registry of every run this process knows about.
///
/// Entries are never removed automatically; eviction is the caller's call,
/// typically after handing the manifest to durable storage.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: DashMap<Uuid, Arc<RwLock<RunState>>>,
}

impl RunRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: DashMap::new(),
        }
    }

    /// Allocate a run entry and the write handle for its crawl task.
    pub fn create(&self, meta: RunMeta) -> (Uuid, RunHandle) {
        let run_id = Uuid::new_v4();
        let state = Arc::new(RwLock::new(RunState::new(meta)));
        self.runs.insert(run_id, Arc::clone(&state));
        (run_id, RunHandle { run_id, state })
    }

    fn entry(&self, run_id: &Uuid) -> Option<Arc<RwLock<RunState>>> {
        self.runs.get(run_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Progress for a run, or `None` for an unknown id.
    pub async fn progress(&self, run_id: &Uuid) -> Option<ProgressSnapshot> {
        let state = self.entry(run_id)?;
        let guard = state.read().await;
        Some(guard.snapshot())
    }

    /// Ordered matched links accumulated so far.
    pub async fn results(&self, run_id: &Uuid) -> Option<Vec<LinkRecord>> {
        let state = self.entry(run_id)?;
        let guard = state.read().await;
        Some(guard.results.clone())
    }

    /// Handoff payload for the persistence collaborator.
    ///
    /// Readable at any time; durable storage should wait until the manifest's
    /// status is terminal.
    pub async fn manifest(&self, run_id: &Uuid) -> Option<RunManifest> {
        let state = self.entry(run_id)?;
        let guard = state.read().await;
        Some(RunManifest::from_state(*run_id, &guard))
    }

    /// Caller-driven eviction. Returns whether the entry existed.
    pub fn remove(&self, run_id: &Uuid) -> bool {
        self.runs.remove(run_id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Single-writer side of one run entry, held by the crawl task for the
/// lifetime of the run.
#[derive(Debug, Clone)]
pub struct RunHandle {
    run_id: Uuid,
    state: Arc<RwLock<RunState>>,
}

impl RunHandle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.run_id
    }

    pub async fn mark_running(&self) {
        self.state.write().await.advance(RunStatus::Running);
    }

    pub async fn mark_done(&self) {
        self.state.write().await.advance(RunStatus::Done);
    }

    /// Record a fatal error: message captured, partial results retained.
    pub async fn fail(&self, message: String) {
        let mut state = self.state.write().await;
        if state.status.can_advance_to(RunStatus::Error) {
            state.error = Some(message);
            state.advance(RunStatus::Error);
        } else {
            log::warn!(
                "dropping error for run {} already in {:?}: {message}",
                self.run_id,
                state.status
            );
        }
    }

    /// Set the ETA denominator (the run's total page budget).
    pub async fn set_page_budget(&self, budget: usize) {
        self.state.write().await.page_budget = budget;
    }

    /// Record a page the traversal committed to, before its fetch finishes.
    pub async fn record_visit(&self, pages_visited: usize, pages_queued: usize) {
        let mut state = self.state.write().await;
        state.pages_visited = pages_visited;
        state.pages_queued = pages_queued;
    }

    /// Record a processed page: counters plus newly deduplicated matches.
    pub async fn record_page(
        &self,
        pages_visited: usize,
        pages_queued: usize,
        links_seen: usize,
        matches: Vec<LinkRecord>,
    ) {
        let mut state = self.state.write().await;
        state.pages_visited = pages_visited;
        state.pages_queued = pages_queued;
        state.links_seen += links_seen;
        state.results.extend(matches);
    }

    /// Read-side snapshot, mainly for the owning task and tests.
    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.state.read().await.snapshot()
    }
}
