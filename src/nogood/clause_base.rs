//! Storage for learnt (and originally-posted) clauses, with activity
//! bumping and a forgetful eviction pass.

use super::Literal;

/// Identity of a clause within one [`ClauseBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseId(u32);

impl ClauseId {
    #[must_use]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A stored clause plus its activity score (how often it has
/// participated in a recent conflict).
#[derive(Debug, Clone)]
pub struct LearntClause {
    /// The clause's literals.
    pub literals: Vec<Literal>,
    /// Recency-weighted participation count.
    pub activity: f64,
    /// Originally-posted clauses (e.g. from DIMACS input) are never
    /// forgotten; only derived nogoods are eligible for eviction.
    pub learnt: bool,
}

/// Owns every clause the solver currently knows about.
#[derive(Debug, Default)]
pub struct ClauseBase {
    clauses: Vec<LearntClause>,
    increment: f64,
}

impl ClauseBase {
    /// An empty base.
    #[must_use]
    pub fn new() -> Self {
        Self { clauses: Vec::new(), increment: 1.0 }
    }

    /// Add an original (non-learnt) clause, e.g. from a DIMACS file.
    pub fn add(&mut self, literals: Vec<Literal>) -> ClauseId {
        let id = ClauseId(self.clauses.len() as u32);
        self.clauses.push(LearntClause { literals, activity: 0.0, learnt: false });
        id
    }

    /// Add a derived nogood from conflict analysis.
    pub fn add_learnt(&mut self, literals: Vec<Literal>) -> ClauseId {
        let id = ClauseId(self.clauses.len() as u32);
        self.clauses.push(LearntClause { literals, activity: self.increment, learnt: true });
        id
    }

    /// Borrow a clause by id.
    #[must_use]
    pub fn get(&self, id: ClauseId) -> &LearntClause {
        &self.clauses[id.index()]
    }

    /// Every stored clause together with its id, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (ClauseId, &LearntClause)> {
        self.clauses.iter().enumerate().map(|(i, c)| (ClauseId(i as u32), c))
    }

    /// Number of clauses currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether no clauses have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Bump a clause's activity by the current increment, the way a
    /// conflict analysis pass credits every clause it resolves through.
    pub fn bump_activity(&mut self, id: ClauseId) {
        self.clauses[id.index()].activity += self.increment;
    }

    /// Decay every clause's activity (called once per conflict), rescaling
    /// the increment upward instead of every activity downward so this
    /// stays O(1) rather than O(clauses).
    pub fn decay(&mut self, decay_factor: f64) {
        self.increment /= decay_factor;
    }

    /// Discard the lowest-activity `fraction` of learnt clauses (original
    /// clauses are never evicted). Call on restart.
    pub fn forget(&mut self, fraction: f64) {
        let learnt_count = self.clauses.iter().filter(|c| c.learnt).count();
        let to_drop = ((learnt_count as f64) * fraction).floor() as usize;
        if to_drop == 0 {
            return;
        }
        let mut learnt_indices: Vec<usize> =
            self.clauses.iter().enumerate().filter(|(_, c)| c.learnt).map(|(i, _)| i).collect();
        learnt_indices.sort_by(|&a, &b| self.clauses[a].activity.total_cmp(&self.clauses[b].activity));
        let drop_set: std::collections::HashSet<usize> = learnt_indices.into_iter().take(to_drop).collect();
        let mut kept = Vec::with_capacity(self.clauses.len() - to_drop);
        for (i, clause) in self.clauses.drain(..).enumerate() {
            if !drop_set.contains(&i) {
                kept.push(clause);
            }
        }
        self.clauses = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VarId;

    #[test]
    fn forget_drops_only_the_lowest_activity_learnt_clauses() {
        let mut base = ClauseBase::new();
        let v = VarId::from_index(0);
        let original = base.add(vec![Literal::positive(v)]);
        let low = base.add_learnt(vec![Literal::negative(v)]);
        let high = base.add_learnt(vec![Literal::positive(v)]);
        base.bump_activity(high);
        base.bump_activity(high);

        base.forget(0.5);

        assert_eq!(base.len(), 2);
        assert!(!base.get(original).learnt);
        let remaining_learnt: Vec<_> = (0..base.len() as u32).map(ClauseId).filter(|&id| base.get(id).learnt).collect();
        assert_eq!(remaining_learnt.len(), 1);
        let _ = low;
    }
}
