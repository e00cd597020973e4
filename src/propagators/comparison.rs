//! `x == y`, `x < y`, `x <= y`.

use super::{PropagateOutcome, Propagator};
use crate::propagation::Context;
use crate::variables::{EventKind, MutateOutcome, VarId, VarStore};

/// Binary equality: mutually narrows both bounds until they coincide.
#[derive(Debug, Clone, Copy)]
pub struct Equal {
    scope: [VarId; 2],
}

impl Equal {
    /// Post `x == y`.
    #[must_use]
    pub fn new(x: VarId, y: VarId) -> Self {
        Self { scope: [x, y] }
    }
}

impl Propagator for Equal {
    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn trigger(&self, _pos: usize) -> EventKind {
        EventKind::Range
    }

    fn propagate(&self, ctx: &mut Context) -> PropagateOutcome {
        let [x, y] = self.scope;
        let mut changed = false;
        loop {
            let (xmin, xmax, ymin, ymax) = {
                let vars = ctx.vars();
                (vars.min(x), vars.max(x), vars.min(y), vars.max(y))
            };
            if xmin > ymax || ymin > xmax {
                return PropagateOutcome::Failed;
            }
            let lo = xmin.max(ymin);
            let hi = xmax.min(ymax);
            let mut round_changed = false;
            if lo > xmin {
                match ctx.try_set_min(x, lo) {
                    MutateOutcome::Failed => return PropagateOutcome::Failed,
                    MutateOutcome::Changed(_) => round_changed = true,
                    MutateOutcome::Unchanged => {}
                }
            }
            if hi < xmax {
                match ctx.try_set_max(x, hi) {
                    MutateOutcome::Failed => return PropagateOutcome::Failed,
                    MutateOutcome::Changed(_) => round_changed = true,
                    MutateOutcome::Unchanged => {}
                }
            }
            if lo > ymin {
                match ctx.try_set_min(y, lo) {
                    MutateOutcome::Failed => return PropagateOutcome::Failed,
                    MutateOutcome::Changed(_) => round_changed = true,
                    MutateOutcome::Unchanged => {}
                }
            }
            if hi < ymax {
                match ctx.try_set_max(y, hi) {
                    MutateOutcome::Failed => return PropagateOutcome::Failed,
                    MutateOutcome::Changed(_) => round_changed = true,
                    MutateOutcome::Unchanged => {}
                }
            }
            if !round_changed {
                break;
            }
            changed = true;
        }
        if changed { PropagateOutcome::Narrowed } else { PropagateOutcome::Idle }
    }

    fn check(&self, assignment: &dyn Fn(VarId) -> i64) -> bool {
        let [x, y] = self.scope;
        assignment(x) == assignment(y)
    }
}

/// Binary strict ordering `x < y`, with an optional `or_equal` relaxation
/// to `x <= y`.
#[derive(Debug, Clone, Copy)]
pub struct LessThan {
    scope: [VarId; 2],
    or_equal: bool,
}

impl LessThan {
    /// Post `x < y`.
    #[must_use]
    pub fn new(x: VarId, y: VarId) -> Self {
        Self { scope: [x, y], or_equal: false }
    }

    fn margin(&self) -> i64 {
        i64::from(!self.or_equal)
    }
}

impl Propagator for LessThan {
    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn trigger(&self, _pos: usize) -> EventKind {
        EventKind::Range
    }

    fn propagate(&self, ctx: &mut Context) -> PropagateOutcome {
        let [x, y] = self.scope;
        let margin = self.margin();
        let (xmax, ymin) = {
            let vars = ctx.vars();
            (vars.max(x), vars.min(y))
        };
        let mut changed = false;
        if xmax > ymin - margin {
            match ctx.try_set_max(x, ymin - margin) {
                MutateOutcome::Failed => return PropagateOutcome::Failed,
                MutateOutcome::Changed(_) => changed = true,
                MutateOutcome::Unchanged => {}
            }
        }
        let (xmin, ymax) = {
            let vars = ctx.vars();
            (vars.min(x), vars.max(y))
        };
        if ymax < xmin + margin {
            match ctx.try_set_min(y, xmin + margin) {
                MutateOutcome::Failed => return PropagateOutcome::Failed,
                MutateOutcome::Changed(_) => changed = true,
                MutateOutcome::Unchanged => {}
            }
        }
        if changed { PropagateOutcome::Narrowed } else { PropagateOutcome::Idle }
    }

    fn check(&self, assignment: &dyn Fn(VarId) -> i64) -> bool {
        let [x, y] = self.scope;
        if self.or_equal { assignment(x) <= assignment(y) } else { assignment(x) < assignment(y) }
    }

    fn rewrite(&self, vars: &VarStore) -> Option<Box<dyn Propagator>> {
        let [x, y] = self.scope;
        if vars.is_fixed(x) && vars.is_fixed(y) {
            // Both sides are ground and already known consistent (`propagate`
            // would have failed otherwise); nothing further to watch.
            Some(Box::new(NoOp))
        } else {
            None
        }
    }
}

/// `x <= y`, expressed as `LessThan` with the strict margin relaxed.
#[derive(Debug, Clone, Copy)]
pub struct LessThanOrEqual(LessThan);

impl LessThanOrEqual {
    /// Post `x <= y`.
    #[must_use]
    pub fn new(x: VarId, y: VarId) -> Self {
        Self(LessThan { scope: [x, y], or_equal: true })
    }
}

impl Propagator for LessThanOrEqual {
    fn scope(&self) -> &[VarId] {
        self.0.scope()
    }

    fn trigger(&self, pos: usize) -> EventKind {
        self.0.trigger(pos)
    }

    fn propagate(&self, ctx: &mut Context) -> PropagateOutcome {
        self.0.propagate(ctx)
    }

    fn check(&self, assignment: &dyn Fn(VarId) -> i64) -> bool {
        self.0.check(assignment)
    }

    fn rewrite(&self, vars: &VarStore) -> Option<Box<dyn Propagator>> {
        self.0.rewrite(vars)
    }
}

/// A propagator subsumed by an earlier fixpoint: always idle, matches
/// nothing further. Used as the rewrite target once a comparison between
/// two ground variables is known to hold.
#[derive(Debug, Clone, Copy)]
struct NoOp;

impl Propagator for NoOp {
    fn scope(&self) -> &[VarId] {
        &[]
    }

    fn propagate(&self, _ctx: &mut Context) -> PropagateOutcome {
        PropagateOutcome::Idle
    }

    fn check(&self, _assignment: &dyn Fn(VarId) -> i64) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::VarEventQueue;
    use crate::trail::Trail;
    use crate::variables::DomainFlags;

    #[test]
    fn equal_narrows_both_sides_to_the_overlap() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 5, DomainFlags::empty());
        let y = vars.new_range(3, 8, DomainFlags::empty());
        let prop = Equal::new(x, y);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        assert_eq!(prop.propagate(&mut ctx), PropagateOutcome::Narrowed);
        drop(ctx);
        assert_eq!(vars.min(x), 3);
        assert_eq!(vars.max(x), 5);
        assert_eq!(vars.min(y), 3);
        assert_eq!(vars.max(y), 5);
    }

    #[test]
    fn less_than_pushes_bounds_apart() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 10, DomainFlags::empty());
        let y = vars.new_range(1, 10, DomainFlags::empty());
        let _ = vars.try_set_max(y, 3);
        let prop = LessThan::new(x, y);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        assert_eq!(prop.propagate(&mut ctx), PropagateOutcome::Narrowed);
        drop(ctx);
        assert_eq!(vars.max(x), 2);
    }

    #[test]
    fn less_than_or_equal_allows_equality() {
        let mut vars = VarStore::new();
        let x = vars.new_constant(4);
        let y = vars.new_constant(4);
        let prop = LessThanOrEqual::new(x, y);
        assert!(prop.check(&|v| vars.min(v)));
    }
}
