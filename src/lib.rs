//! Forum-aware link discovery engine.
//!
//! `linkscout` fetches pages through a chain of anti-bot retrieval strategies,
//! extracts and filters hyperlinks, follows forum pagination or walks a site
//! breadth-first, and exposes every run's progress and results through a
//! concurrent registry so long crawls can be observed while they execute.

pub mod config;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod pagination;
pub mod registry;

pub use config::{ConfigError, ScanConfig, ScanConfigBuilder, TraversalMode};
pub use engine::{CrawlFatal, DEFAULT_MAX_CONCURRENT_RUNS, RobotsPolicy, ScanService};
pub use extract::{LinkRecord, extract_links};
pub use fetch::{Backend, FetchError, FetchRequest};
pub use pagination::{PaginationTemplate, bump_page, resolve_next};
pub use registry::{ProgressSnapshot, RunHandle, RunManifest, RunMeta, RunRegistry, RunStatus};
