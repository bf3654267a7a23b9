//! Error types shared across the crate.

use thiserror::Error;

/// Errors surfaced while loading instances, building models or solving.
///
/// Running out of time or nodes is deliberately not an error: an exhausted
/// search still returns its best incumbent, flagged as not proven optimal.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The input data cannot describe a valid instance (fewer than two
    /// points, non-square matrix, missing or non-finite entries).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No tour satisfies the active constraint set.
    #[error("no feasible tour exists under the given constraints")]
    Infeasible,

    /// An assignment accepted by the solver did not decode into a single
    /// closed tour visiting every point.
    #[error("malformed solution: {0}")]
    MalformedSolution(String),

    /// Underlying file I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;
