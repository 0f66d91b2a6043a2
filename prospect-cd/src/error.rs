//! Error types for prospect-cd

use thiserror::Error;

/// Discovery-level error type
///
/// Adapter failures never surface here: the orchestrator converts them into
/// empty contributions. The only run-level failure is a query that cannot be
/// searched at all.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Query cannot be searched meaningfully (e.g. empty company name)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// prospect-common error
    #[error("Common error: {0}")]
    Common(#[from] prospect_common::Error),
}

/// Result type for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
