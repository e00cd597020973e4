//! `x != y`.

use super::{PropagateOutcome, Propagator};
use crate::propagation::Context;
use crate::variables::{EventKind, VarId, VarStore};

/// Binary disequality, grounded on the teacher's `con_not_eq.rs` shape:
/// value-triggered, fires only once one side is ground.
#[derive(Debug, Clone, Copy)]
pub struct NotEqual {
    scope: [VarId; 2],
}

impl NotEqual {
    /// Post `x != y`.
    #[must_use]
    pub fn new(x: VarId, y: VarId) -> Self {
        Self { scope: [x, y] }
    }
}

impl Propagator for NotEqual {
    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn trigger(&self, _pos: usize) -> EventKind {
        EventKind::Value
    }

    fn propagate(&self, ctx: &mut Context) -> PropagateOutcome {
        let [x, y] = self.scope;
        let vars = ctx.vars();
        let (x_fixed, y_fixed) = (vars.is_fixed(x), vars.is_fixed(y));
        if x_fixed && y_fixed {
            return if vars.min(x) == vars.min(y) { PropagateOutcome::Failed } else { PropagateOutcome::Idle };
        }
        if x_fixed {
            return remove_fixed_value(ctx, y, vars.min(x));
        }
        if y_fixed {
            return remove_fixed_value(ctx, x, vars.min(y));
        }
        PropagateOutcome::Idle
    }

    fn check(&self, assignment: &dyn Fn(VarId) -> i64) -> bool {
        let [x, y] = self.scope;
        assignment(x) != assignment(y)
    }
}

fn remove_fixed_value(ctx: &mut Context, var: VarId, value: i64) -> PropagateOutcome {
    match ctx.try_remove(var, value) {
        crate::variables::MutateOutcome::Failed => PropagateOutcome::Failed,
        crate::variables::MutateOutcome::Changed(_) => PropagateOutcome::Narrowed,
        crate::variables::MutateOutcome::Unchanged => PropagateOutcome::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::VarEventQueue;
    use crate::trail::Trail;
    use crate::variables::DomainFlags;

    #[test]
    fn fixing_one_side_excludes_its_value_from_the_other() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 1, DomainFlags::empty());
        let y = vars.new_range(1, 3, DomainFlags::empty());
        let prop = NotEqual::new(x, y);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        assert_eq!(prop.propagate(&mut ctx), PropagateOutcome::Narrowed);
        drop(ctx);
        assert!(!vars.contains(y, 1));
    }

    #[test]
    fn both_ground_and_equal_fails() {
        let mut vars = VarStore::new();
        let x = vars.new_constant(5);
        let y = vars.new_constant(5);
        let prop = NotEqual::new(x, y);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        assert_eq!(prop.propagate(&mut ctx), PropagateOutcome::Failed);
    }
}
