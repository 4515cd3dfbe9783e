//! Error taxonomy for page retrieval.

/// Why a retrieval strategy, or the whole auto chain, failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The target rejected the request (HTTP 403) within the strategy's
    /// retry budget. The message concatenates every attempt's failure.
    #[error("blocked by target: {0}")]
    Blocked(String),

    /// Network or timeout failure distinct from an explicit block.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// Rendered retrieval produced no usable markup.
    #[error("render failure: {0}")]
    RenderFailure(String),

    /// Auto mode exhausted every strategy; carries each strategy's failure
    /// detail for diagnostics.
    #[error("all retrieval backends failed: {}", causes.join(" | "))]
    AllBackendsFailed { causes: Vec<String> },
}
