//! Solutions and search statistics.

use std::ops::Index;
use std::time::Duration;

use crate::variables::VarId;

/// A ground assignment, indexable by the [`VarId`] handles used to
/// declare the variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    values: Vec<i64>,
}

impl Solution {
    /// Capture a solution from a fully-fixed variable store, given the
    /// number of declared variables and a lookup closure.
    #[must_use]
    pub fn capture(count: usize, value_of: impl Fn(VarId) -> i64) -> Self {
        let values = (0..count).map(|i| value_of(VarId::from_index(i))).collect();
        Self { values }
    }

    /// Number of variables captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<VarId> for Solution {
    type Output = i64;

    fn index(&self, index: VarId) -> &i64 {
        &self.values[index.index()]
    }
}

/// Statistics collected over one `solve`/`minimize`/`maximize` call,
/// mirroring the fields the teacher crate's `SolveStats` exposes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveStats {
    /// Number of propagator invocations.
    pub propagation_count: u64,
    /// Number of search-tree nodes explored.
    pub node_count: u64,
    /// Number of backtracks performed.
    pub backtrack_count: u64,
    /// Number of conflicts analysed (nogoods learnt).
    pub conflict_count: u64,
    /// Number of restarts performed.
    pub restart_count: u64,
    /// Total wall-clock time spent solving.
    pub solve_time: Duration,
}

impl SolveStats {
    /// Propagations per search node, `0.0` if no nodes were explored.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.propagation_count as f64 / self.node_count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solution_indexes_by_var_id() {
        let sol = Solution::capture(3, |v| (v.index() as i64) * 10);
        assert_eq!(sol[VarId::from_index(1)], 10);
        assert_eq!(sol.len(), 3);
    }

    #[test]
    fn efficiency_is_zero_with_no_nodes() {
        let stats = SolveStats::default();
        assert_eq!(stats.efficiency(), 0.0);
    }
}
