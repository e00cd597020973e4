//! `sum(c_i * x_i) {=,<=} k`.

use super::{PropagateOutcome, Propagator};
use crate::propagation::Context;
use crate::variables::{EventKind, MutateOutcome, VarId};

/// Comparison a [`LinearSum`] enforces against its weighted total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearRelation {
    /// `sum == k`.
    Equal,
    /// `sum <= k`.
    LessOrEqual,
}

/// Bounds-consistent propagation for a weighted sum, grounded on the
/// interval-arithmetic bound-tightening pattern used throughout the
/// teacher crate's binary comparisons, generalised to n terms.
#[derive(Debug, Clone)]
pub struct LinearSum {
    scope: Vec<VarId>,
    coeffs: Vec<i64>,
    k: i64,
    relation: LinearRelation,
}

impl LinearSum {
    /// Post `sum(coeffs[i] * scope[i]) relation k`.
    ///
    /// # Panics
    ///
    /// Panics if `scope` and `coeffs` differ in length.
    #[must_use]
    pub fn new(scope: Vec<VarId>, coeffs: Vec<i64>, relation: LinearRelation, k: i64) -> Self {
        assert_eq!(scope.len(), coeffs.len(), "one coefficient per term");
        Self { scope, coeffs, k, relation }
    }

    fn term_bounds(&self, ctx: &Context, pos: usize) -> (i64, i64) {
        let vars = ctx.vars();
        let v = self.scope[pos];
        let c = self.coeffs[pos];
        if c >= 0 {
            (c * vars.min(v), c * vars.max(v))
        } else {
            (c * vars.max(v), c * vars.min(v))
        }
    }
}

impl Propagator for LinearSum {
    fn scope(&self) -> &[VarId] {
        &self.scope
    }

    fn priority(&self) -> u8 {
        1
    }

    fn trigger(&self, _pos: usize) -> EventKind {
        EventKind::Range
    }

    fn propagate(&self, ctx: &mut Context) -> PropagateOutcome {
        let mut changed = false;
        loop {
            let (lo_sum, hi_sum): (i64, i64) = {
                let mut lo = 0;
                let mut hi = 0;
                for pos in 0..self.scope.len() {
                    let (l, h) = self.term_bounds(ctx, pos);
                    lo += l;
                    hi += h;
                }
                (lo, hi)
            };

            if self.relation == LinearRelation::Equal {
                if lo_sum > self.k || hi_sum < self.k {
                    return PropagateOutcome::Failed;
                }
            } else if lo_sum > self.k {
                return PropagateOutcome::Failed;
            }

            let upper_slack = match self.relation {
                LinearRelation::Equal => self.k - lo_sum,
                LinearRelation::LessOrEqual => self.k - lo_sum,
            };
            let lower_slack = match self.relation {
                LinearRelation::Equal => hi_sum - self.k,
                LinearRelation::LessOrEqual => i64::MAX,
            };

            let mut round_changed = false;
            for pos in 0..self.scope.len() {
                let c = self.coeffs[pos];
                if c == 0 {
                    continue;
                }
                let (term_lo, term_hi) = self.term_bounds(ctx, pos);
                let v = self.scope[pos];

                // The term's own bound can be no larger than what the
                // rest of the sum's slack allows.
                let max_term = term_lo + upper_slack;
                if max_term < term_hi {
                    let outcome = if c > 0 { ctx.try_set_max(v, max_term.div_euclid(c)) } else { ctx.try_set_min(v, max_term.div_euclid(c)) };
                    match outcome {
                        MutateOutcome::Failed => return PropagateOutcome::Failed,
                        MutateOutcome::Changed(_) => round_changed = true,
                        MutateOutcome::Unchanged => {}
                    }
                }

                if self.relation == LinearRelation::Equal && lower_slack != i64::MAX {
                    let min_term = term_hi - lower_slack;
                    if min_term > term_lo {
                        let outcome = if c > 0 {
                            ctx.try_set_min(v, div_ceil(min_term, c))
                        } else {
                            ctx.try_set_max(v, div_ceil(min_term, c))
                        };
                        match outcome {
                            MutateOutcome::Failed => return PropagateOutcome::Failed,
                            MutateOutcome::Changed(_) => round_changed = true,
                            MutateOutcome::Unchanged => {}
                        }
                    }
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
        let sum: i64 = self.scope.iter().zip(&self.coeffs).map(|(&v, &c)| c * assignment(v)).sum();
        match self.relation {
            LinearRelation::Equal => sum == self.k,
            LinearRelation::LessOrEqual => sum <= self.k,
        }
    }
}

fn div_ceil(a: i64, b: i64) -> i64 {
    if b > 0 { a.div_euclid(b) + i64::from(a.rem_euclid(b) != 0) } else { (-a).div_euclid(-b) + i64::from((-a).rem_euclid(-b) != 0) }
}
