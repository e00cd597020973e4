//! Error types returned by the public solver API.
//!
//! Failure to find a solution, running out of a node/time/fail budget, or
//! being cancelled mid-search are *not* represented here: those are
//! first-class outcomes of [`crate::Outcome`], not exceptions. This enum is
//! reserved for programming errors and malformed input — the two
//! categories a caller can actually fix by changing what it passed in.

use thiserror::Error;

/// Errors that can be returned while building or configuring a [`crate::Solver`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// A propagator or variable was posted after search had already started.
    /// Constraints may only be added before the root node, or while the
    /// solver is paused for a restart.
    #[error("cannot post {what} after search has started")]
    PostAfterSearchStarted {
        /// What kind of thing was being posted (`"variable"`, `"propagator"`).
        what: &'static str,
    },

    /// A heuristic name passed to [`crate::search::HeuristicRegistry`] has no
    /// registered entry.
    #[error("unknown variable/value heuristic: {name}")]
    UnknownHeuristic {
        /// The unresolved name.
        name: String,
    },

    /// A restart-policy name has no registered entry.
    #[error("unknown restart policy: {name}")]
    UnknownRestartPolicy {
        /// The unresolved name.
        name: String,
    },

    /// A variable identifier did not refer to a live variable in this solver.
    #[error("invalid variable id: {id}")]
    InvalidVariable {
        /// The offending id, formatted for display.
        id: String,
    },

    /// A domain was malformed, e.g. `min > max`, or an empty initial set.
    #[error("invalid domain for {variable}: {message}")]
    InvalidDomain {
        /// Name or id of the variable.
        variable: String,
        /// What made the domain invalid.
        message: String,
    },

    /// The DIMACS CNF text could not be parsed.
    #[error("DIMACS parse error at line {line}: {message}")]
    DimacsParse {
        /// 1-based line number.
        line: usize,
        /// Description of the malformed input.
        message: String,
    },
}

/// Convenience alias used throughout the crate's public API.
pub type SolverResult<T> = Result<T, SolverError>;
