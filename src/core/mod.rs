//! Error types, configuration, solutions, and the external cancellation
//! handle.

pub mod config;
pub mod error;
pub mod solution;

pub use config::{SolverConfig, Verbosity};
pub use error::{SolverError, SolverResult};
pub use solution::{SolveStats, Solution};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A write-once-from-outside cancellation signal, polled by the search
/// controller at the same points as its resource limits.
///
/// Replaces a process-wide interrupt handler (the design note this
/// generalises away from): a caller embedding this crate in a service can
/// own one of these per request and flip it from any thread without the
/// solver needing to install a global signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// A flag that starts unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent, callable from any thread.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_visible_through_a_clone() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
