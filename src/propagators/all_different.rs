//! `all_different(x_1, ..., x_n)`.

use super::{PropagateOutcome, Propagator};
use crate::propagation::Context;
use crate::variables::{EventKind, MutateOutcome, VarId};

/// Pairwise-support all-different: for every ground variable, removes its
/// value from every other variable in scope.
///
/// This is the simple `O(n^2)` filtering, not full generalised arc
/// consistency (Hall-interval reasoning) — concrete global-constraint
/// algorithms are outside this crate's scope; see `SPEC_FULL.md` §4.10.
#[derive(Debug, Clone)]
pub struct AllDifferent {
    scope: Vec<VarId>,
}

impl AllDifferent {
    /// Post `all_different` over `scope`.
    #[must_use]
    pub fn new(scope: Vec<VarId>) -> Self {
        Self { scope }
    }
}

impl Propagator for AllDifferent {
    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn priority(&self) -> u8 {
        2
    }

    fn trigger(&self, _pos: usize) -> EventKind {
        EventKind::Value
    }

    fn propagate(&self, ctx: &mut Context) -> PropagateOutcome {
        let ground_values: Vec<(usize, i64)> = {
            let vars = ctx.vars();
            self.scope
                .iter()
                .enumerate()
                .filter(|(_, &v)| vars.is_fixed(v))
                .map(|(i, &v)| (i, vars.min(v)))
                .collect()
        };

        let mut changed = false;
        for (ground_pos, value) in ground_values {
            for (pos, &var) in self.scope.iter().enumerate() {
                if pos == ground_pos {
                    continue;
                }
                if ctx.vars().is_fixed(var) {
                    continue;
                }
                match ctx.try_remove(var, value) {
                    MutateOutcome::Failed => return PropagateOutcome::Failed,
                    MutateOutcome::Changed(_) => changed = true,
                    MutateOutcome::Unchanged => {}
                }
            }
        }
        if changed { PropagateOutcome::Narrowed } else { PropagateOutcome::Idle }
    }

    fn check(&self, assignment: &dyn Fn(VarId) -> i64) -> bool {
        let mut seen = Vec::with_capacity(self.scope.len());
        for &v in &self.scope {
            let value = assignment(v);
            if seen.contains(&value) {
                return false;
            }
            seen.push(value);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::VarEventQueue;
    use crate::trail::Trail;
    use crate::variables::{DomainFlags, VarStore};

    #[test]
    fn ground_variable_excludes_its_value_from_the_rest() {
        let mut vars = VarStore::new();
        let a = vars.new_constant(2);
        let b = vars.new_range(1, 3, DomainFlags::empty());
        let c = vars.new_range(1, 3, DomainFlags::empty());
        let prop = AllDifferent::new(vec![a, b, c]);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        assert_eq!(prop.propagate(&mut ctx), PropagateOutcome::Narrowed);
        drop(ctx);
        assert!(!vars.contains(b, 2));
        assert!(!vars.contains(c, 2));
    }

    #[test]
    fn check_rejects_a_repeated_value() {
        let prop = AllDifferent::new(vec![VarId::from_index(0), VarId::from_index(1)]);
        let values = [3, 3];
        assert!(!prop.check(&|v| values[v.index()]));
    }
}
