//! Variable/value selection heuristics and their registry.
//!
//! A small string-keyed registry resolves heuristic names to trait
//! objects, replacing a template/generic-factory approach with runtime
//! lookup — the registry pattern favoured throughout this crate's design
//! notes over compile-time specialisation for anything user-configurable.

use rand::Rng;

use crate::core::error::{SolverError, SolverResult};
use crate::variables::{VarId, VarStore};

/// Picks which unassigned variable to branch on next.
pub trait VariableSelector: std::fmt::Debug {
    /// Choose one variable from `candidates` (all currently unfixed).
    /// Returns `None` only if `candidates` is empty.
    fn select(&self, vars: &VarStore, candidates: &[VarId]) -> Option<VarId>;
}

/// Picks which value (or bound split) to try first for a chosen variable.
pub trait ValueSelector: std::fmt::Debug {
    /// Choose a value in `var`'s current domain to branch on first.
    fn select(&self, vars: &VarStore, var: VarId, rng: &mut dyn RngHandle) -> i64;
}

/// Object-safe RNG handle so [`ValueSelector`] doesn't need a generic
/// parameter threaded through every call site.
pub trait RngHandle {
    /// A pseudo-random `u64`.
    fn next_u64(&mut self) -> u64;
}

impl<R: Rng> RngHandle for R {
    fn next_u64(&mut self) -> u64 {
        self.random()
    }
}

/// Smallest-domain-first ("first-fail").
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFail;

impl VariableSelector for FirstFail {
    fn select(&self, vars: &VarStore, candidates: &[VarId]) -> Option<VarId> {
        candidates.iter().copied().min_by_key(|&v| vars.max(v) - vars.min(v))
    }
}

/// Declaration-order variable selection (the simplest possible policy).
#[derive(Debug, Clone, Copy, Default)]
pub struct InOrder;

impl VariableSelector for InOrder {
    fn select(&self, _vars: &VarStore, candidates: &[VarId]) -> Option<VarId> {
        candidates.first().copied()
    }
}

/// Branch on the current lower bound first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinValue;

impl ValueSelector for MinValue {
    fn select(&self, vars: &VarStore, var: VarId, _rng: &mut dyn RngHandle) -> i64 {
        vars.min(var)
    }
}

/// Branch on the current upper bound first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxValue;

impl ValueSelector for MaxValue {
    fn select(&self, vars: &VarStore, var: VarId, _rng: &mut dyn RngHandle) -> i64 {
        vars.max(var)
    }
}

/// A uniformly random value from `[min, max]` (not necessarily in the
/// domain for a non-convex bitset domain; callers that need exactness
/// should intersect with `contains` themselves).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomValue;

impl ValueSelector for RandomValue {
    fn select(&self, vars: &VarStore, var: VarId, rng: &mut dyn RngHandle) -> i64 {
        let (min, max) = (vars.min(var), vars.max(var));
        if min >= max {
            return min;
        }
        let span = (max - min + 1) as u64;
        min + (rng.next_u64() % span) as i64
    }
}

/// Resolves heuristic names (as configured on
/// [`crate::core::config::SolverConfig`]) to the trait objects that
/// implement them.
#[derive(Debug)]
pub struct HeuristicRegistry {
    variable_selectors: Vec<(&'static str, Box<dyn VariableSelector>)>,
    value_selectors: Vec<(&'static str, Box<dyn ValueSelector>)>,
}

impl Default for HeuristicRegistry {
    fn default() -> Self {
        let mut registry = Self { variable_selectors: Vec::new(), value_selectors: Vec::new() };
        registry.register_variable_selector("first_fail", Box::new(FirstFail));
        registry.register_variable_selector("in_order", Box::new(InOrder));
        registry.register_value_selector("min", Box::new(MinValue));
        registry.register_value_selector("max", Box::new(MaxValue));
        registry.register_value_selector("random", Box::new(RandomValue));
        registry
    }
}

impl HeuristicRegistry {
    /// Add or replace a named variable-selection heuristic.
    pub fn register_variable_selector(&mut self, name: &'static str, selector: Box<dyn VariableSelector>) {
        if let Some(slot) = self.variable_selectors.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = selector;
        } else {
            self.variable_selectors.push((name, selector));
        }
    }

    /// Add or replace a named value-selection heuristic.
    pub fn register_value_selector(&mut self, name: &'static str, selector: Box<dyn ValueSelector>) {
        if let Some(slot) = self.value_selectors.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = selector;
        } else {
            self.value_selectors.push((name, selector));
        }
    }

    /// Look up a variable-selection heuristic by name.
    pub fn variable_selector(&self, name: &str) -> SolverResult<&dyn VariableSelector> {
        self.variable_selectors
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| s.as_ref())
            .ok_or_else(|| SolverError::UnknownHeuristic { name: name.to_string() })
    }

    /// Look up a value-selection heuristic by name.
    pub fn value_selector(&self, name: &str) -> SolverResult<&dyn ValueSelector> {
        self.value_selectors
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| s.as_ref())
            .ok_or_else(|| SolverError::UnknownHeuristic { name: name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::DomainFlags;

    #[test]
    fn first_fail_picks_the_smallest_domain() {
        let mut vars = VarStore::new();
        let a = vars.new_range(1, 10, DomainFlags::empty());
        let b = vars.new_range(1, 2, DomainFlags::empty());
        let sel = FirstFail;
        assert_eq!(sel.select(&vars, &[a, b]), Some(b));
    }

    #[test]
    fn registry_resolves_default_names_and_rejects_unknown_ones() {
        let registry = HeuristicRegistry::default();
        assert!(registry.variable_selector("first_fail").is_ok());
        assert!(registry.value_selector("min").is_ok());
        assert!(registry.value_selector("nonexistent").is_err());
    }
}
