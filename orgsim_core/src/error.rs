//! Error types for the organisation model.

use thiserror::Error;

/// Errors surfaced by engine construction and tick execution.
///
/// Configuration and dimension errors are fatal and detected once at
/// construction; no partially usable component is ever returned. Invariant
/// violations are fatal mid-run faults. Every error-level condition is
/// broadcast to the log listeners before the `Err` is returned.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Tensor rank/shape mismatch detected by the agent-set consistency check.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Plant/reporting/board dimension mismatch detected at organisation
    /// construction.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A tensor or collaborator output became malformed mid-run.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
