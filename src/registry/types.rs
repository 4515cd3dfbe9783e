//! Run state, progress snapshots, and the persistence handoff manifest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ScanConfig, TraversalMode};
use crate::extract::LinkRecord;
use crate::fetch::Backend;

/// Lifecycle of a run. Transitions are forward-only:
/// `queued -> running -> done | error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl RunStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Running)
                | (Self::Running, Self::Done)
                | (Self::Running, Self::Error)
        )
    }
}

/// Immutable run parameters, echoed back in the manifest so the persistence
/// collaborator can store a run without reaching into the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub source_url: String,
    pub keyword: String,
    pub refine: Option<String>,
    pub match_text: bool,
    pub match_url: bool,
    pub same_domain_only: bool,
    pub backend: Backend,
    pub mode: TraversalMode,
    pub max_pages: usize,
    pub pause_ms: u64,
}

impl From<&ScanConfig> for RunMeta {
    fn from(config: &ScanConfig) -> Self {
        Self {
            source_url: config.start_url.clone(),
            keyword: config.keyword.clone(),
            refine: config.refine.clone(),
            match_text: config.match_text,
            match_url: config.match_url,
            same_domain_only: config.same_domain_only,
            backend: config.backend,
            mode: config.mode,
            max_pages: config.max_pages,
            pause_ms: config.pause_ms,
        }
    }
}

/// Mutable per-run state. The crawl task is the only writer, through its
/// `RunHandle`; the registry hands out read snapshots.
#[derive(Debug)]
pub struct RunState {
    pub(crate) meta: RunMeta,
    pub(crate) status: RunStatus,
    pub(crate) error: Option<String>,
    pub(crate) pages_visited: usize,
    pub(crate) pages_queued: usize,
    pub(crate) page_budget: usize,
    pub(crate) links_seen: usize,
    pub(crate) results: Vec<LinkRecord>,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    pub(crate) fn new(meta: RunMeta) -> Self {
        let page_budget = meta.max_pages;
        Self {
            meta,
            status: RunStatus::Queued,
            error: None,
            pages_visited: 0,
            pages_queued: 1,
            page_budget,
            links_seen: 0,
            results: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Advance the status, refusing regressions and skipped states.
    pub(crate) fn advance(&mut self, next: RunStatus) {
        if self.status.can_advance_to(next) {
            self.status = next;
            if next.is_terminal() {
                self.finished_at = Some(Utc::now());
            }
        } else {
            log::warn!(
                "refusing status transition {:?} -> {next:?}",
                self.status
            );
        }
    }

    pub(crate) fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            status: self.status,
            pages_visited: self.pages_visited,
            pages_queued: self.pages_queued,
            links_seen: self.links_seen,
            links_matched: self.results.len(),
            eta_seconds: self.eta_seconds(),
            error: self.error.clone(),
        }
    }

    /// Elapsed-based remaining-time estimate, only meaningful mid-run.
    fn eta_seconds(&self) -> Option<u64> {
        if self.status != RunStatus::Running || self.pages_visited == 0 {
            return None;
        }
        let remaining = self.page_budget.saturating_sub(self.pages_visited);
        if remaining == 0 {
            return Some(0);
        }
        let elapsed_ms = (Utc::now() - self.started_at).num_milliseconds().max(0) as u64;
        let per_page_ms = elapsed_ms / self.pages_visited as u64;
        Some(per_page_ms * remaining as u64 / 1000)
    }
}

/// One poll's view of a run. Copied out under the entry lock, so a reader
/// never observes a torn update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: RunStatus,
    pub pages_visited: usize,
    pub pages_queued: usize,
    pub links_seen: usize,
    pub links_matched: usize,
    /// Estimated seconds until the page budget is spent; absent outside
    /// `running` or before the first page.
    pub eta_seconds: Option<u64>,
    pub error: Option<String>,
}

/// Durable handoff payload for a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub meta: RunMeta,
    pub status: RunStatus,
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_visited: usize,
    pub links_seen: usize,
    pub links_matched: usize,
    pub results: Vec<LinkRecord>,
}

impl RunManifest {
    pub(crate) fn from_state(run_id: Uuid, state: &RunState) -> Self {
        Self {
            run_id,
            meta: state.meta.clone(),
            status: state.status,
            error: state.error.clone(),
            started_at: state.started_at,
            finished_at: state.finished_at,
            pages_visited: state.pages_visited,
            links_seen: state.links_seen,
            links_matched: state.results.len(),
            results: state.results.clone(),
        }
    }
}
