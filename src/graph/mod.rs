//! The bipartite variable/constraint incidence graph.
//!
//! For each variable, three buckets hold the propagators that wake on a
//! value, range, or domain event respectively. Registration happens once,
//! while propagators are posted (before search starts, per the crate's
//! scope); dispatch is a pure lookup with no further bookkeeping, so it
//! needs no trail entries of its own.

use crate::propagators::PropId;
use crate::variables::{EventKind, VarId};

#[derive(Debug, Default, Clone)]
struct Buckets {
    value: Vec<PropId>,
    range: Vec<PropId>,
    domain: Vec<PropId>,
}

impl Buckets {
    fn bucket_mut(&mut self, kind: EventKind) -> &mut Vec<PropId> {
        match kind {
            EventKind::Value => &mut self.value,
            EventKind::Range => &mut self.range,
            EventKind::Domain => &mut self.domain,
        }
    }
}

/// Incidence graph between variables and the propagators that depend on
/// them, bucketed by the event strength that wakes each dependency.
#[derive(Debug, Default)]
pub struct ConstraintGraph {
    buckets: Vec<Buckets>,
    priority: Vec<u8>,
}

impl ConstraintGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_var(&mut self, var: VarId) {
        if var.index() >= self.buckets.len() {
            self.buckets.resize_with(var.index() + 1, Buckets::default);
        }
    }

    /// Record that `prop` (running at `priority`) wakes when `var` changes
    /// at least as strongly as `trigger`.
    pub fn register(&mut self, var: VarId, trigger: EventKind, prop: PropId, priority: u8) {
        self.ensure_var(var);
        self.buckets[var.index()].bucket_mut(trigger).push(prop);
        if prop.index() >= self.priority.len() {
            self.priority.resize(prop.index() + 1, 0);
        }
        self.priority[prop.index()] = priority;
    }

    /// Priority a previously registered propagator was posted at.
    #[must_use]
    pub fn priority_of(&self, prop: PropId) -> u8 {
        self.priority.get(prop.index()).copied().unwrap_or(0)
    }

    /// Every propagator woken by an event of strength `kind` on `var`,
    /// i.e. every propagator registered for a trigger that `kind`
    /// satisfies (see [`EventKind::satisfies`]).
    pub fn dependents(&self, var: VarId, kind: EventKind) -> impl Iterator<Item = PropId> + '_ {
        let empty: &[PropId] = &[];
        let b = self.buckets.get(var.index());
        let value = if kind.satisfies(EventKind::Value) { b.map_or(empty, |b| &b.value) } else { empty };
        let range = if kind.satisfies(EventKind::Range) { b.map_or(empty, |b| &b.range) } else { empty };
        let domain = if kind.satisfies(EventKind::Domain) { b.map_or(empty, |b| &b.domain) } else { empty };
        value.iter().chain(range).chain(domain).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_event_wakes_every_bucket() {
        let mut g = ConstraintGraph::new();
        let v = VarId::from_index(0);
        let p_value = PropId::from_index(0);
        let p_range = PropId::from_index(1);
        let p_domain = PropId::from_index(2);
        g.register(v, EventKind::Value, p_value, 0);
        g.register(v, EventKind::Range, p_range, 0);
        g.register(v, EventKind::Domain, p_domain, 0);

        let woken: Vec<_> = g.dependents(v, EventKind::Value).collect();
        assert_eq!(woken, vec![p_value, p_range, p_domain]);
    }

    #[test]
    fn domain_event_wakes_only_domain_bucket() {
        let mut g = ConstraintGraph::new();
        let v = VarId::from_index(0);
        let p_value = PropId::from_index(0);
        let p_domain = PropId::from_index(1);
        g.register(v, EventKind::Value, p_value, 0);
        g.register(v, EventKind::Domain, p_domain, 0);

        let woken: Vec<_> = g.dependents(v, EventKind::Domain).collect();
        assert_eq!(woken, vec![p_domain]);
    }
}
