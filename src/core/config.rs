//! Solver configuration.
//!
//! [`SolverConfig`] collects every tunable named in the programmatic
//! surface — resource limits, restart schedule, activity bookkeeping,
//! branching policy, and verbosity — behind a builder-method API, the way
//! the teacher crate's `SolverConfig` does for its own (smaller) set of
//! knobs.

use std::time::Duration;

use crate::search::restart::RestartPolicy;

/// How much solver progress is logged via `tracing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// No extra logging beyond `warn`-level events.
    #[default]
    Silent,
    /// One event per solution and per restart.
    Normal,
    /// One event per backtrack and backjump in addition to `Normal`.
    Verbose,
    /// One event per decision and per propagator firing.
    Trace,
}

/// Full set of search/resource parameters for a [`crate::Solver`].
///
/// Construct with [`SolverConfig::default`] and adjust with the builder
/// methods, mirroring the teacher crate's `with_*`/`without_*` idiom.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Enumerate every solution instead of stopping at the first.
    pub find_all: bool,
    /// Maximum number of search-tree nodes to explore.
    pub node_limit: Option<u64>,
    /// Maximum number of backtracks.
    pub backtrack_limit: Option<u64>,
    /// Maximum number of propagator invocations.
    pub propagation_limit: Option<u64>,
    /// Maximum number of failed nodes (domain wipe-outs).
    pub fail_limit: Option<u64>,
    /// Wall-clock budget for the whole search.
    pub time_limit: Option<Duration>,
    /// Seed for the solver's private RNG (value selection, restarts).
    pub seed: u64,
    /// Restart schedule.
    pub restart_policy: RestartPolicy,
    /// Initial restart interval (in conflicts), for geometric and Luby schedules.
    pub restart_base: u64,
    /// Growth factor applied to the restart interval on a geometric schedule.
    pub restart_factor: f64,
    /// Amount added to a variable's activity when it is bumped.
    pub activity_increment: f64,
    /// Multiplicative decay applied to all activities after each conflict.
    pub activity_decay: f64,
    /// Activity assigned to newly created variables.
    pub init_activity: f64,
    /// Fraction of learnt clauses discarded on each forget pass.
    pub forgetfulness: f64,
    /// Probability in `[0, 1]` of making a random decision instead of
    /// consulting the heuristic.
    pub randomization: f64,
    /// Shuffle variable/value order once at the root before searching.
    pub shuffle: bool,
    /// Run the solution checker before reporting a solution.
    pub checked: bool,
    /// Enable conflict-directed backjumping (vs. plain chronological backtracking).
    pub backjump: bool,
    /// Name of the registered variable-selection heuristic to use.
    pub variable_selection: String,
    /// Name of the registered value-selection heuristic to use.
    pub value_selection: String,
    /// Re-evaluate the value heuristic at every node rather than fixing an
    /// order at the root.
    pub dynamic_value: bool,
    /// Logging verbosity.
    pub verbosity: Verbosity,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            find_all: false,
            node_limit: None,
            backtrack_limit: None,
            propagation_limit: None,
            fail_limit: None,
            time_limit: Some(Duration::from_secs(60)),
            seed: 0,
            restart_policy: RestartPolicy::None,
            restart_base: 100,
            restart_factor: 1.5,
            activity_increment: 1.0,
            activity_decay: 0.95,
            init_activity: 0.0,
            forgetfulness: 0.5,
            randomization: 0.0,
            shuffle: false,
            checked: true,
            backjump: true,
            variable_selection: "first_fail".to_string(),
            value_selection: "min".to_string(),
            dynamic_value: false,
            verbosity: Verbosity::Silent,
        }
    }
}

impl SolverConfig {
    /// A config with every resource limit removed — the caller is
    /// responsible for bounding search some other way (e.g. `find_all =
    /// false`, or an external [`crate::core::CancellationFlag`]).
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            node_limit: None,
            backtrack_limit: None,
            propagation_limit: None,
            fail_limit: None,
            time_limit: None,
            ..Self::default()
        }
    }

    /// Enumerate all solutions rather than stopping at the first.
    #[must_use]
    pub const fn with_find_all(mut self, find_all: bool) -> Self {
        self.find_all = find_all;
        self
    }

    /// Cap the number of search-tree nodes explored.
    #[must_use]
    pub const fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    /// Cap the number of backtracks.
    #[must_use]
    pub const fn with_backtrack_limit(mut self, limit: u64) -> Self {
        self.backtrack_limit = Some(limit);
        self
    }

    /// Cap the number of failed nodes.
    #[must_use]
    pub const fn with_fail_limit(mut self, limit: u64) -> Self {
        self.fail_limit = Some(limit);
        self
    }

    /// Set the wall-clock search budget.
    #[must_use]
    pub const fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Remove the wall-clock search budget.
    #[must_use]
    pub const fn without_time_limit(mut self) -> Self {
        self.time_limit = None;
        self
    }

    /// Seed the solver's private RNG.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the restart schedule.
    #[must_use]
    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }

    /// Set the registered variable-selection heuristic by name.
    #[must_use]
    pub fn with_variable_selection(mut self, name: impl Into<String>) -> Self {
        self.variable_selection = name.into();
        self
    }

    /// Set the registered value-selection heuristic by name.
    #[must_use]
    pub fn with_value_selection(mut self, name: impl Into<String>) -> Self {
        self.value_selection = name.into();
        self
    }

    /// Set the logging verbosity.
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Disable conflict-directed backjumping, falling back to plain
    /// chronological backtracking.
    #[must_use]
    pub const fn without_backjump(mut self) -> Self {
        self.backjump = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_a_time_limit_and_backjumping() {
        let cfg = SolverConfig::default();
        assert!(cfg.time_limit.is_some());
        assert!(cfg.backjump);
        assert_eq!(cfg.restart_policy, RestartPolicy::None);
    }

    #[test]
    fn unbounded_clears_every_limit() {
        let cfg = SolverConfig::unbounded();
        assert!(cfg.node_limit.is_none());
        assert!(cfg.backtrack_limit.is_none());
        assert!(cfg.propagation_limit.is_none());
        assert!(cfg.fail_limit.is_none());
        assert!(cfg.time_limit.is_none());
    }

    #[test]
    fn builder_methods_compose() {
        let cfg = SolverConfig::default()
            .with_find_all(true)
            .with_node_limit(1_000)
            .with_seed(42)
            .without_backjump();
        assert!(cfg.find_all);
        assert_eq!(cfg.node_limit, Some(1_000));
        assert_eq!(cfg.seed, 42);
        assert!(!cfg.backjump);
    }
}
