//! The mutation surface handed to propagators.
//!
//! Grounded on the teacher crate's `views::Context` (`vars: &mut Vars,
//! events: &mut Vec<VarId>`): propagators never touch the variable store,
//! trail, or event queue directly, only through this narrow wrapper, so
//! every narrowing is automatically trailed and queued.

use crate::propagators::PropId;
use crate::queues::VarEventQueue;
use crate::trail::Trail;
use crate::variables::{MutateOutcome, VarId, VarStore};

/// Borrowed handle a propagator uses to read and narrow domains during one
/// `propagate`/`notify_assignment` call.
#[derive(Debug)]
pub struct Context<'a> {
    vars: &'a mut VarStore,
    trail: &'a mut Trail,
    events: &'a mut VarEventQueue,
    cause: Option<PropId>,
}

impl<'a> Context<'a> {
    /// Build a context for the propagator identified by `cause` (or `None`
    /// for root-level / search-controller mutations outside any
    /// propagator).
    pub fn new(vars: &'a mut VarStore, trail: &'a mut Trail, events: &'a mut VarEventQueue, cause: Option<PropId>) -> Self {
        Self { vars, trail, events, cause }
    }

    /// Read-only access to the live domains.
    #[must_use]
    pub fn vars(&self) -> &VarStore {
        self.vars
    }

    fn record_and(&mut self, var: VarId, outcome: MutateOutcome) -> MutateOutcome {
        if let MutateOutcome::Changed(kind) = outcome {
            self.events.push(var, kind, self.cause);
        }
        outcome
    }

    /// Fix `var` to `value`.
    pub fn try_assign(&mut self, var: VarId, value: i64) -> MutateOutcome {
        let (base, old) = self.vars.snapshot(var);
        self.trail.record_domain(base, old);
        let outcome = self.vars.try_assign(var, value);
        self.record_and(base, outcome)
    }

    /// Remove `value` from `var`'s domain.
    pub fn try_remove(&mut self, var: VarId, value: i64) -> MutateOutcome {
        let (base, old) = self.vars.snapshot(var);
        self.trail.record_domain(base, old);
        let outcome = self.vars.try_remove(var, value);
        self.record_and(base, outcome)
    }

    /// Raise `var`'s lower bound to at least `value`.
    pub fn try_set_min(&mut self, var: VarId, value: i64) -> MutateOutcome {
        let (base, old) = self.vars.snapshot(var);
        self.trail.record_domain(base, old);
        let outcome = self.vars.try_set_min(var, value);
        self.record_and(base, outcome)
    }

    /// Lower `var`'s upper bound to at most `value`.
    pub fn try_set_max(&mut self, var: VarId, value: i64) -> MutateOutcome {
        let (base, old) = self.vars.snapshot(var);
        self.trail.record_domain(base, old);
        let outcome = self.vars.try_set_max(var, value);
        self.record_and(base, outcome)
    }

    /// The propagator currently running this context, if any.
    #[must_use]
    pub fn cause(&self) -> Option<PropId> {
        self.cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::DomainFlags;

    #[test]
    fn narrowing_through_context_trails_and_queues_an_event() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 10, DomainFlags::empty());
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();

        trail.push_level();
        {
            let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
            let outcome = ctx.try_set_min(x, 4);
            assert_eq!(outcome, MutateOutcome::Changed(crate::variables::EventKind::Range));
        }
        assert!(!events.is_empty());

        trail.restore_to(0, &mut vars);
        assert_eq!(vars.min(x), 1);
    }

    #[test]
    fn narrowing_through_a_view_queues_the_event_under_its_base() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 10, DomainFlags::empty());
        let view = vars.new_view(x, 1, 5);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();

        trail.push_level();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        let _ = ctx.try_set_min(view, 8);

        let (reported, _) = events.pop().expect("narrowing the view queued an event");
        assert_eq!(reported, x, "the event must be attributed to the base variable, not the view");
    }
}
