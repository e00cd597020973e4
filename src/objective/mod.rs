//! Objective management: satisfaction, optimisation, and enumeration.
//!
//! Grounded on the teacher crate's `search::mode::Mode` trait
//! (`on_solution`, and `Minimize<V>`'s `minimum_opt` bookkeeping), widened
//! to the four modes the programmatic surface exposes.

use crate::variables::VarId;

/// Final result of a search, matching the programmatic surface's contract
/// (`§6`): resource limits and cancellation are reported here, never as
/// an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one solution was found; search is not known to be complete.
    Sat,
    /// The search space was exhausted with no solution found.
    Unsat,
    /// An optimal solution was found and proven optimal.
    Opt,
    /// A resource limit (node/backtrack/propagation/fail/time) or the
    /// external cancellation flag stopped the search before it could
    /// prove completeness.
    LimitOut,
    /// Nothing could be determined (e.g. zero variables posted).
    Unknown,
}

/// What the search is trying to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    /// Stop at the first solution.
    Satisfaction,
    /// Minimise the value of a distinguished variable.
    Minimize(VarId),
    /// Maximise the value of a distinguished variable.
    Maximize(VarId),
    /// Enumerate every solution.
    Enumerate,
}

/// Tracks the objective across a search run: whether to keep searching
/// after a solution, and the best value seen so far for optimisation
/// modes.
#[derive(Debug, Clone)]
pub struct ObjectiveManager {
    kind: ObjectiveKind,
    best: Option<i64>,
    solutions_found: u64,
}

impl ObjectiveManager {
    /// Start tracking `kind`.
    #[must_use]
    pub fn new(kind: ObjectiveKind) -> Self {
        Self { kind, best: None, solutions_found: 0 }
    }

    /// The kind of objective being tracked.
    #[must_use]
    pub fn kind(&self) -> ObjectiveKind {
        self.kind
    }

    /// The objective variable for `Minimize`/`Maximize`, if any.
    #[must_use]
    pub fn objective_variable(&self) -> Option<VarId> {
        match self.kind {
            ObjectiveKind::Minimize(v) | ObjectiveKind::Maximize(v) => Some(v),
            ObjectiveKind::Satisfaction | ObjectiveKind::Enumerate => None,
        }
    }

    /// Whether search should continue looking for a better/another
    /// solution after one was just found.
    #[must_use]
    pub fn continues_after_solution(&self) -> bool {
        !matches!(self.kind, ObjectiveKind::Satisfaction)
    }

    /// Record a solution with the given objective value (ignored for
    /// `Satisfaction`/`Enumerate`). Returns the bound the next search
    /// should improve on, if any.
    pub fn notify_solution(&mut self, objective_value: Option<i64>) -> Option<(VarId, i64)> {
        self.solutions_found += 1;
        match (self.kind, objective_value) {
            (ObjectiveKind::Minimize(v), Some(value)) => {
                self.best = Some(value);
                Some((v, value - 1))
            }
            (ObjectiveKind::Maximize(v), Some(value)) => {
                self.best = Some(value);
                Some((v, value + 1))
            }
            _ => None,
        }
    }

    /// Decide the final [`Outcome`] once search has stopped, given whether
    /// it stopped because the space was exhausted or because a limit /
    /// cancellation cut it short.
    #[must_use]
    pub fn outcome(&self, exhausted: bool) -> Outcome {
        if self.solutions_found == 0 {
            return if exhausted { Outcome::Unsat } else { Outcome::LimitOut };
        }
        match self.kind {
            ObjectiveKind::Satisfaction => Outcome::Sat,
            ObjectiveKind::Enumerate => {
                if exhausted {
                    Outcome::Opt
                } else {
                    Outcome::Unknown
                }
            }
            ObjectiveKind::Minimize(_) | ObjectiveKind::Maximize(_) => {
                if exhausted {
                    Outcome::Opt
                } else {
                    Outcome::LimitOut
                }
            }
        }
    }

    /// Best objective value found so far, if any.
    #[must_use]
    pub fn best(&self) -> Option<i64> {
        self.best
    }

    /// How many solutions have been reported so far.
    #[must_use]
    pub fn solutions_found(&self) -> u64 {
        self.solutions_found
    }
}
