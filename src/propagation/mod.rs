//! The propagation fixpoint engine.
//!
//! Draining proceeds in two nested loops, mirroring the teacher crate's
//! `propagate` function (`search/mod.rs`) generalised to a trail instead
//! of a cloned space: pop a propagator off the [`ConstraintQueue`], run
//! it, translate whatever domain events it produced into newly-woken
//! dependents via the [`ConstraintGraph`], and repeat until both queues
//! are empty (a fixpoint) or some propagator reports failure.

pub mod context;

pub use context::Context;

use crate::graph::ConstraintGraph;
use crate::propagators::{PropId, Propagator};
use crate::queues::{ConstraintQueue, VarEventQueue};
use crate::trail::Trail;
use crate::variables::VarStore;

/// Result of draining the queues to a fixpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixpointOutcome {
    /// Every propagator is idle; domains are locally consistent.
    Consistent,
    /// Some propagator (or a direct bound violation) emptied a domain.
    WipeOut,
}

/// Drive `queue` and the graph-derived dependents to a fixpoint.
///
/// `props[i]` must correspond to `PropId::from_index(i)`. Re-entrant: may
/// be called again after a decision pushes new events onto `var_events`.
pub fn run_to_fixpoint(
    vars: &mut VarStore,
    trail: &mut Trail,
    graph: &ConstraintGraph,
    var_events: &mut VarEventQueue,
    queue: &mut ConstraintQueue,
    props: &[Box<dyn Propagator>],
) -> FixpointOutcome {
    loop {
        while let Some((var, kind, source)) = var_events.pop() {
            for dep in graph.dependents(var, kind) {
                // A propagator never re-wakes itself off the event its own
                // narrowing just produced (idempotence).
                if Some(dep) == source {
                    continue;
                }
                queue.schedule(dep, graph.priority_of(dep));
            }
        }

        let Some(prop_id) = queue.pop() else {
            return FixpointOutcome::Consistent;
        };

        let mut ctx = Context::new(vars, trail, var_events, Some(prop_id));
        match props[prop_id.index()].propagate(&mut ctx) {
            crate::propagators::PropagateOutcome::Failed => return FixpointOutcome::WipeOut,
            crate::propagators::PropagateOutcome::Idle | crate::propagators::PropagateOutcome::Narrowed => {}
        }

        for &scope_var in props[prop_id.index()].scope() {
            if vars.is_fixed(scope_var) {
                let mut ctx = Context::new(vars, trail, var_events, Some(prop_id));
                props[prop_id.index()].notify_assignment(scope_var, &mut ctx);
            }
        }

        if var_events.is_empty() && queue.is_empty() {
            return FixpointOutcome::Consistent;
        }
    }
}

/// Schedule every propagator in `props` once, typically used to seed the
/// queue right after posting (so each propagator gets its first chance to
/// prune before any decision is made).
pub fn schedule_all(queue: &mut ConstraintQueue, props: &[Box<dyn Propagator>]) {
    for (idx, prop) in props.iter().enumerate() {
        queue.schedule(PropId::from_index(idx), prop.priority());
    }
}

/// Same as [`run_to_fixpoint`], but also reports which propagator (if any)
/// detected the wipe-out, so a search controller can localise a conflict to
/// that propagator's scope for backjumping.
pub fn run_to_fixpoint_tracking(
    vars: &mut VarStore,
    trail: &mut Trail,
    graph: &ConstraintGraph,
    var_events: &mut VarEventQueue,
    queue: &mut ConstraintQueue,
    props: &[Box<dyn Propagator>],
) -> (FixpointOutcome, Option<PropId>) {
    loop {
        while let Some((var, kind, source)) = var_events.pop() {
            for dep in graph.dependents(var, kind) {
                // A propagator never re-wakes itself off the event its own
                // narrowing just produced (idempotence).
                if Some(dep) == source {
                    continue;
                }
                queue.schedule(dep, graph.priority_of(dep));
            }
        }

        let Some(prop_id) = queue.pop() else {
            return (FixpointOutcome::Consistent, None);
        };

        let mut ctx = Context::new(vars, trail, var_events, Some(prop_id));
        match props[prop_id.index()].propagate(&mut ctx) {
            crate::propagators::PropagateOutcome::Failed => return (FixpointOutcome::WipeOut, Some(prop_id)),
            crate::propagators::PropagateOutcome::Idle | crate::propagators::PropagateOutcome::Narrowed => {}
        }

        for &scope_var in props[prop_id.index()].scope() {
            if vars.is_fixed(scope_var) {
                let mut ctx = Context::new(vars, trail, var_events, Some(prop_id));
                props[prop_id.index()].notify_assignment(scope_var, &mut ctx);
            }
        }

        if var_events.is_empty() && queue.is_empty() {
            return (FixpointOutcome::Consistent, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagators::{Equal, NotEqual};
    use crate::variables::DomainFlags;
    use std::cell::Cell;

    /// A propagator scoped over two variables where narrowing one of them
    /// (through its own `propagate`) produces an event on the *other*
    /// scope variable, which is also triggered on this same propagator —
    /// used to check that a propagator's own narrowing never re-wakes it.
    #[derive(Debug)]
    struct SelfScopedNarrow {
        scope: [crate::variables::VarId; 2],
        calls: std::rc::Rc<Cell<u32>>,
    }

    impl Propagator for SelfScopedNarrow {
        fn scope(&self) -> &[crate::variables::VarId] {
            &self.scope
        }

        fn trigger(&self, _pos: usize) -> crate::variables::EventKind {
            crate::variables::EventKind::Value
        }

        fn propagate(&self, ctx: &mut Context) -> crate::propagators::PropagateOutcome {
            self.calls.set(self.calls.get() + 1);
            let y = self.scope[1];
            if ctx.vars().is_fixed(y) {
                return crate::propagators::PropagateOutcome::Idle;
            }
            match ctx.try_remove(y, 1) {
                crate::variables::MutateOutcome::Failed => crate::propagators::PropagateOutcome::Failed,
                crate::variables::MutateOutcome::Changed(_) => crate::propagators::PropagateOutcome::Narrowed,
                crate::variables::MutateOutcome::Unchanged => crate::propagators::PropagateOutcome::Idle,
            }
        }

        fn check(&self, _assignment: &dyn Fn(crate::variables::VarId) -> i64) -> bool {
            true
        }
    }

    #[test]
    fn fixpoint_on_an_already_consistent_pair_is_idle() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let x = vars.new_range(1, 5, DomainFlags::empty());
        let y = vars.new_range(1, 5, DomainFlags::empty());
        let props: Vec<Box<dyn Propagator>> = vec![Box::new(NotEqual::new(x, y))];
        let mut graph = ConstraintGraph::new();
        graph.register(x, crate::variables::EventKind::Value, PropId::from_index(0), 0);
        graph.register(y, crate::variables::EventKind::Value, PropId::from_index(0), 0);
        let mut var_events = VarEventQueue::new();
        let mut queue = ConstraintQueue::new();

        let outcome = run_to_fixpoint(&mut vars, &mut trail, &graph, &mut var_events, &mut queue, &props);
        assert_eq!(outcome, FixpointOutcome::Consistent);
    }

    #[test]
    fn fixpoint_detects_wipeout_from_equal_on_disjoint_domains() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let x = vars.new_range(1, 2, DomainFlags::empty());
        let y = vars.new_range(3, 4, DomainFlags::empty());
        let props: Vec<Box<dyn Propagator>> = vec![Box::new(Equal::new(x, y))];
        let mut graph = ConstraintGraph::new();
        graph.register(x, crate::variables::EventKind::Domain, PropId::from_index(0), 0);
        graph.register(y, crate::variables::EventKind::Domain, PropId::from_index(0), 0);
        let mut var_events = VarEventQueue::new();
        let mut queue = ConstraintQueue::new();
        queue.schedule(PropId::from_index(0), 0);

        let outcome = run_to_fixpoint(&mut vars, &mut trail, &graph, &mut var_events, &mut queue, &props);
        assert_eq!(outcome, FixpointOutcome::WipeOut);
    }

    #[test]
    fn a_propagator_does_not_rewake_itself_on_its_own_narrowing() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let x = vars.new_range(1, 1, DomainFlags::empty());
        let y = vars.new_range(1, 2, DomainFlags::empty());
        let prop_id = PropId::from_index(0);
        let calls = std::rc::Rc::new(Cell::new(0));
        let props: Vec<Box<dyn Propagator>> = vec![Box::new(SelfScopedNarrow { scope: [x, y], calls: calls.clone() })];
        let mut graph = ConstraintGraph::new();
        graph.register(x, crate::variables::EventKind::Value, prop_id, 0);
        graph.register(y, crate::variables::EventKind::Value, prop_id, 0);
        let mut var_events = VarEventQueue::new();
        let mut queue = ConstraintQueue::new();
        queue.schedule(prop_id, 0);

        let outcome = run_to_fixpoint(&mut vars, &mut trail, &graph, &mut var_events, &mut queue, &props);
        assert_eq!(outcome, FixpointOutcome::Consistent);
        assert!(vars.is_fixed(y), "removing 1 from {{1, 2}} leaves y fixed at 2");
        assert_eq!(calls.get(), 1, "the propagator must not re-run off the value event its own narrowing of y produced");
    }
}
