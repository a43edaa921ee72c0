//! Error taxonomy shared across the crate

use thiserror::Error;

/// Failures surfaced by the graph store boundary.
///
/// The split drives retry behavior: `Transient` errors are retry-safe and are
/// handled by `MutationExecutor::execute_with_retry`, `Permanent` errors are
/// surfaced to the caller immediately.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection dropped, session expired, service temporarily unavailable.
    #[error("transient store error: {0}")]
    Transient(String),

    /// Statement syntax errors, constraint violations, and other failures
    /// that a retry cannot fix.
    #[error("permanent store error: {0}")]
    Permanent(String),
}

impl StoreError {
    /// Whether this error is safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Malformed input to the graph builder. No partial graph is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Two node records carried the same id within one build.
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    /// A node record is missing the id key, or its value is not a string.
    #[error("node record at position {position} has no string value for id key \"{id_key}\"")]
    MissingNodeId { position: usize, id_key: String },
}

/// Invalid parameters passed to community detection.
///
/// Raised before any detection work starts.
#[derive(Debug, Error, PartialEq)]
pub enum AlgorithmError {
    /// Resolutions must be finite and strictly positive.
    #[error("resolution at position {position} must be a positive finite number, got {value}")]
    InvalidResolution { position: usize, value: f64 },
}

/// Composite error for the end-to-end analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),
}
