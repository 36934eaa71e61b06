//! Error types for stochas analysis.

use thiserror::Error;

/// Errors that can occur during traversal, analysis, or sample-size search.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// Non-convergence of the sample-size search is not an error; it is reported
/// as [`SearchOutcome::Exhausted`](crate::engine::debugger::SearchOutcome::Exhausted).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    /// A filter predicate failed during one traversal. Recoverable by
    /// retrying with a fresh traversal; never retried inside the walker.
    #[error("rejected sample: filter predicate failed on value {value} at generation {generation}")]
    RejectedSample { value: f64, generation: u64 },

    /// Every fresh traversal within a caller's retry budget was rejected.
    #[error("rejection limit reached: {attempts} consecutive traversals were rejected")]
    RejectionLimit { attempts: usize },

    /// Caller programming error: an invalid model, target or config, or a
    /// draw index or stream outside the `u64` generation space.
    #[error("precondition violation: {0}")]
    PreconditionViolation(String),

    /// Numerical stability error (NaN/Inf samples).
    #[error("numerical error: {0}")]
    Numerical(String),
}

impl ExecError {
    /// Returns true for errors a caller may recover from by resampling.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ExecError::RejectedSample { .. })
    }
}
