//! Boolean clause propagation: the DIMACS unit, and the shape every
//! learnt nogood from [`crate::nogood`] is posted back as.

use super::{PropagateOutcome, Propagator};
use crate::nogood::Literal;
use crate::propagation::Context;
use crate::variables::{EventKind, MutateOutcome, VarId};

/// A disjunction of boolean literals: `l_1 \/ l_2 \/ ... \/ l_n`.
/// Propagates by unit resolution — if every literal but one is falsified,
/// the remaining one is forced true.
#[derive(Debug, Clone)]
pub struct Clause {
    literals: Vec<Literal>,
    scope: Vec<VarId>,
}

impl Clause {
    /// Post a clause over `literals`.
    #[must_use]
    pub fn new(literals: Vec<Literal>) -> Self {
        let scope = literals.iter().map(|l| l.var()).collect();
        Self { literals, scope }
    }
}

impl Propagator for Clause {
    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn trigger(&self, _pos: usize) -> EventKind {
        EventKind::Value
    }

    fn propagate(&self, ctx: &mut Context) -> PropagateOutcome {
        let mut unfixed: Option<Literal> = None;
        let mut satisfied = false;
        for &lit in &self.literals {
            let vars = ctx.vars();
            if vars.is_fixed(lit.var()) {
                let value = vars.min(lit.var()) == 1;
                if lit.is_satisfied_by(value) {
                    satisfied = true;
                    break;
                }
            } else if unfixed.is_some() {
                // more than one unfixed literal: nothing to propagate yet
                return PropagateOutcome::Idle;
            } else {
                unfixed = Some(lit);
            }
        }
        if satisfied {
            return PropagateOutcome::Idle;
        }
        match unfixed {
            Some(lit) => {
                let value = i64::from(lit.is_positive());
                match ctx.try_assign(lit.var(), value) {
                    MutateOutcome::Failed => PropagateOutcome::Failed,
                    MutateOutcome::Changed(_) => PropagateOutcome::Narrowed,
                    MutateOutcome::Unchanged => PropagateOutcome::Idle,
                }
            }
            None => PropagateOutcome::Failed,
        }
    }

    fn check(&self, assignment: &dyn Fn(VarId) -> i64) -> bool {
        self.literals.iter().any(|lit| lit.is_satisfied_by(assignment(lit.var()) == 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::VarEventQueue;
    use crate::trail::Trail;
    use crate::variables::VarStore;

    #[test]
    fn unit_propagation_forces_the_last_literal() {
        let mut vars = VarStore::new();
        let a = vars.new_boolean();
        let b = vars.new_boolean();
        let _ = vars.try_assign(a, 0); // a = false
        let clause = Clause::new(vec![Literal::positive(a), Literal::positive(b)]);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        assert_eq!(clause.propagate(&mut ctx), PropagateOutcome::Narrowed);
        drop(ctx);
        assert_eq!(vars.min(b), 1);
    }

    #[test]
    fn all_literals_false_fails() {
        let mut vars = VarStore::new();
        let a = vars.new_boolean();
        let _ = vars.try_assign(a, 0);
        let clause = Clause::new(vec![Literal::positive(a)]);
        let mut trail = Trail::new();
        let mut events = VarEventQueue::new();
        let mut ctx = Context::new(&mut vars, &mut trail, &mut events, None);
        assert_eq!(clause.propagate(&mut ctx), PropagateOutcome::Failed);
    }
}
