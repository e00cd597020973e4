//! The search controllers that drive propagation to a solution.
//!
//! Two controllers share the same reversible [`crate::trail::Trail`] but
//! differ in how they diagnose a conflict: [`dfs_search`] branches on
//! arbitrary finite-domain variables and, on failure, backjumps to the
//! deepest open decision that touches the failing propagator's scope (a
//! simplified form of conflict-directed backjumping, since a general
//! domain has no boolean literal to explain); [`cdcl_search`] is scoped to
//! pure boolean/clausal problems (as loaded from DIMACS) and performs full
//! first-UIP nogood learning via [`crate::nogood::analyze_conflict`].

pub mod decision;
pub mod heuristic;
pub mod restart;

pub use decision::{Decision, Operation};
pub use heuristic::{HeuristicRegistry, RngHandle};
pub use restart::{RestartPolicy, RestartSchedule};

use std::time::{Duration, Instant};

use rand::{rngs::SmallRng, SeedableRng};
use tracing::{debug, trace};

use crate::core::config::SolverConfig;
use crate::core::solution::SolveStats;
use crate::core::{CancellationFlag, Solution};
use crate::graph::ConstraintGraph;
use crate::nogood::{analyze_conflict, ClauseBase, ImplicationTrail, Literal};
use crate::objective::{ObjectiveKind, ObjectiveManager, Outcome};
use crate::propagation::{run_to_fixpoint_tracking, Context, FixpointOutcome};
use crate::propagators::{PropId, Propagator};
use crate::queues::{ConstraintQueue, VarEventQueue};
use crate::trail::Trail;
use crate::variables::{MutateOutcome, VarId, VarStore};

/// Outcome of a finite (non-CDCL) search run.
#[derive(Debug)]
pub struct SearchOutcome {
    /// The final verdict.
    pub outcome: Outcome,
    /// Every solution captured along the way (one entry unless
    /// `find_all`/`Enumerate` was requested).
    pub solutions: Vec<Solution>,
    /// Search statistics accumulated during this run.
    pub stats: SolveStats,
}

fn resource_limit_hit(config: &SolverConfig, stats: &SolveStats, started: Instant) -> bool {
    if let Some(limit) = config.node_limit {
        if stats.node_count >= limit {
            return true;
        }
    }
    if let Some(limit) = config.backtrack_limit {
        if stats.backtrack_count >= limit {
            return true;
        }
    }
    if let Some(limit) = config.propagation_limit {
        if stats.propagation_count >= limit {
            return true;
        }
    }
    if let Some(limit) = config.fail_limit {
        if stats.conflict_count >= limit {
            return true;
        }
    }
    if let Some(limit) = config.time_limit {
        if started.elapsed() >= limit {
            return true;
        }
    }
    false
}

fn apply_decision(ctx: &mut Context, decision: Decision) -> MutateOutcome {
    match decision.operation {
        Operation::Assign => ctx.try_assign(decision.variable, decision.value),
        Operation::Remove => ctx.try_remove(decision.variable, decision.value),
        Operation::SetMin => ctx.try_set_min(decision.variable, decision.value),
        Operation::SetMax => ctx.try_set_max(decision.variable, decision.value),
    }
}

/// Chronological (optionally backjumping) depth-first search over
/// `candidates`, narrowing via `props` and the objective carried in
/// `objective`.
///
/// `candidates` lists every variable the search is allowed to branch on, in
/// no particular order (the variable-selection heuristic picks among the
/// ones still unfixed each time). Variables outside this list may still be
/// touched by propagation; they are simply never branched on directly.
#[allow(clippy::too_many_arguments)]
pub fn dfs_search(
    vars: &mut VarStore,
    trail: &mut Trail,
    graph: &ConstraintGraph,
    props: &[Box<dyn Propagator>],
    candidates: &[VarId],
    heuristics: &HeuristicRegistry,
    objective: &mut ObjectiveManager,
    config: &SolverConfig,
    cancellation: &CancellationFlag,
) -> SearchOutcome {
    let mut var_events = VarEventQueue::new();
    let mut queue = ConstraintQueue::new();
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut decisions: Vec<(Decision, bool)> = Vec::new();
    let mut stats = SolveStats::default();
    let mut solutions = Vec::new();
    let started = Instant::now();

    let variable_selector = heuristics
        .variable_selector(&config.variable_selection)
        .expect("Solver validates heuristic names before search starts");
    let value_selector =
        heuristics.value_selector(&config.value_selection).expect("Solver validates heuristic names before search starts");

    crate::propagation::schedule_all(&mut queue, props);

    loop {
        if cancellation.is_cancelled() || resource_limit_hit(config, &stats, started) {
            stats.solve_time = started.elapsed();
            return SearchOutcome { outcome: objective.outcome(false), solutions, stats };
        }

        let (fixpoint, failing) = run_to_fixpoint_tracking(vars, trail, graph, &mut var_events, &mut queue, props);
        stats.propagation_count += 1;

        if fixpoint == FixpointOutcome::WipeOut {
            stats.conflict_count += 1;
            trace!(level = trail.level(), "conflict");
            let scope = failing.map(|id| props[id.index()].scope().to_vec());
            if !backtrack(vars, trail, &mut var_events, &mut queue, &mut decisions, &mut stats, config, scope.as_deref()) {
                stats.solve_time = started.elapsed();
                return SearchOutcome { outcome: objective.outcome(true), solutions, stats };
            }
            continue;
        }

        let unfixed: Vec<VarId> = candidates.iter().copied().filter(|&v| !vars.is_fixed(v)).collect();
        let Some(var) = variable_selector.select(vars, &unfixed) else {
            let solution = Solution::capture(vars.len(), |v| vars.min(v));
            stats.node_count += 1;
            debug!(solutions = stats.node_count, "solution found");
            solutions.push(solution);

            let bound = objective.notify_solution(objective.objective_variable().map(|v| vars.min(v)));
            if !objective.continues_after_solution() {
                stats.solve_time = started.elapsed();
                return SearchOutcome { outcome: Outcome::Sat, solutions, stats };
            }
            if let Some((ov, bound_value)) = bound {
                let operation = match objective.kind() {
                    ObjectiveKind::Minimize(_) => Operation::SetMax,
                    ObjectiveKind::Maximize(_) => Operation::SetMin,
                    ObjectiveKind::Satisfaction | ObjectiveKind::Enumerate => Operation::SetMax,
                };
                let tightened = Decision::new(ov, operation, bound_value);
                trail.push_level();
                let mut ctx = Context::new(vars, trail, &mut var_events, None);
                let _ = apply_decision(&mut ctx, tightened);
                decisions.push((tightened, true));
            }
            if !backtrack(vars, trail, &mut var_events, &mut queue, &mut decisions, &mut stats, config, None) {
                stats.solve_time = started.elapsed();
                return SearchOutcome { outcome: objective.outcome(true), solutions, stats };
            }
            continue;
        };

        let value = value_selector.select(vars, var, &mut rng);
        let decision = Decision::new(var, Operation::Assign, value);
        trail.push_level();
        let mut ctx = Context::new(vars, trail, &mut var_events, None);
        let outcome = apply_decision(&mut ctx, decision);
        decisions.push((decision, false));
        stats.node_count += 1;
        trace!(var = %var, value, "branch");

        if outcome == MutateOutcome::Failed {
            stats.conflict_count += 1;
            if !backtrack(vars, trail, &mut var_events, &mut queue, &mut decisions, &mut stats, config, Some(&[var])) {
                stats.solve_time = started.elapsed();
                return SearchOutcome { outcome: objective.outcome(true), solutions, stats };
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn backtrack(
    vars: &mut VarStore,
    trail: &mut Trail,
    var_events: &mut VarEventQueue,
    queue: &mut ConstraintQueue,
    decisions: &mut Vec<(Decision, bool)>,
    stats: &mut SolveStats,
    config: &SolverConfig,
    scope: Option<&[VarId]>,
) -> bool {
    loop {
        let target = if config.backjump {
            deepest_unflipped_intersecting(decisions, scope).or_else(|| deepest_unflipped(decisions))
        } else {
            deepest_unflipped(decisions)
        };
        let Some(level) = target else { return false };

        trail.restore_to(level - 1, vars);
        var_events.clear();
        *queue = ConstraintQueue::new();

        let (decision, is_right) = decisions[level - 1];
        if is_right {
            decisions.truncate(level - 1);
            continue;
        }

        let inverted = decision.invert();
        trail.push_level();
        let mut ctx = Context::new(vars, trail, var_events, None);
        let outcome = apply_decision(&mut ctx, inverted);
        decisions.truncate(level - 1);
        decisions.push((inverted, true));
        stats.backtrack_count += 1;

        if outcome == MutateOutcome::Failed {
            continue;
        }
        return true;
    }
}

fn deepest_unflipped(decisions: &[(Decision, bool)]) -> Option<usize> {
    (1..=decisions.len()).rev().find(|&l| !decisions[l - 1].1)
}

fn deepest_unflipped_intersecting(decisions: &[(Decision, bool)], scope: Option<&[VarId]>) -> Option<usize> {
    let scope = scope?;
    (1..=decisions.len()).rev().find(|&l| !decisions[l - 1].1 && scope.contains(&decisions[l - 1].0.variable))
}

/// Scan every clause once, unit-propagating forced literals and recording
/// their reasons. Returns the falsified clause's literals on conflict.
fn unit_propagate(
    vars: &mut VarStore,
    trail: &mut Trail,
    clauses: &ClauseBase,
    implication: &mut ImplicationTrail,
    level: u32,
) -> Result<(), Vec<Literal>> {
    loop {
        let mut changed = false;
        for (id, clause) in clauses.iter() {
            let mut unfixed: Option<Literal> = None;
            let mut satisfied = false;
            for &lit in &clause.literals {
                if vars.is_fixed(lit.var()) {
                    if lit.is_satisfied_by(vars.min(lit.var()) == 1) {
                        satisfied = true;
                        break;
                    }
                } else if unfixed.is_some() {
                    unfixed = None;
                    satisfied = true; // more than one unfixed literal: nothing forced yet
                    break;
                } else {
                    unfixed = Some(lit);
                }
            }
            if satisfied {
                continue;
            }
            match unfixed {
                Some(lit) => {
                    let (base, old) = vars.snapshot(lit.var());
                    trail.record_domain(base, old);
                    let value = lit.is_positive();
                    let _ = vars.try_assign(lit.var(), i64::from(value));
                    implication.record_implied(lit.var(), value, level, id);
                    changed = true;
                }
                None => return Err(clause.literals.clone()),
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

/// Full CDCL search over a purely boolean/clausal problem (e.g. one loaded
/// from DIMACS): unit propagation, first-UIP conflict analysis, learnt
/// clause storage, and a configurable restart schedule.
pub fn cdcl_search(
    vars: &mut VarStore,
    trail: &mut Trail,
    clauses: &mut ClauseBase,
    bool_vars: &[VarId],
    config: &SolverConfig,
    cancellation: &CancellationFlag,
) -> SearchOutcome {
    let mut implication = ImplicationTrail::new();
    let mut restart = RestartSchedule::new(config.restart_policy, config.restart_base, config.restart_factor);
    let mut stats = SolveStats::default();
    let mut level: u32 = 0;
    let started = Instant::now();

    loop {
        if cancellation.is_cancelled() || resource_limit_hit(config, &stats, started) {
            stats.solve_time = started.elapsed();
            return SearchOutcome { outcome: Outcome::LimitOut, solutions: Vec::new(), stats };
        }

        stats.propagation_count += 1;
        match unit_propagate(vars, trail, clauses, &mut implication, level) {
            Err(conflict) => {
                stats.conflict_count += 1;
                if level == 0 {
                    stats.solve_time = started.elapsed();
                    return SearchOutcome { outcome: Outcome::Unsat, solutions: Vec::new(), stats };
                }
                let (learnt, backjump) = analyze_conflict(&conflict, &implication, clauses, level);
                let learnt_id = clauses.add_learnt(learnt);
                clauses.bump_activity(learnt_id);
                clauses.decay(config.activity_decay);

                trail.restore_to(backjump as usize, vars);
                implication.undo_to(backjump);
                level = backjump;
                stats.backtrack_count += 1;

                if restart.record_conflict() {
                    trail.restore_to(0, vars);
                    implication.undo_to(0);
                    level = 0;
                    clauses.forget(config.forgetfulness);
                    restart.advance();
                    stats.restart_count += 1;
                    debug!(restarts = stats.restart_count, "restart");
                }
                continue;
            }
            Ok(()) => {}
        }

        let Some(var) = bool_vars.iter().copied().find(|&v| !vars.is_fixed(v)) else {
            let solution = Solution::capture(vars.len(), |v| vars.min(v));
            stats.solve_time = started.elapsed();
            return SearchOutcome { outcome: Outcome::Sat, solutions: vec![solution], stats };
        };

        level += 1;
        trail.push_level();
        let (base, old) = vars.snapshot(var);
        trail.record_domain(base, old);
        let _ = vars.try_assign(var, 1);
        implication.record_decision(var, true, level);
        stats.node_count += 1;
        trace!(var = %var, level, "decide");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveKind;
    use crate::propagators::NotEqual;
    use crate::variables::{DomainFlags, EventKind};

    #[test]
    fn dfs_search_separates_two_not_equal_variables() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let x = vars.new_range(1, 2, DomainFlags::empty());
        let y = vars.new_range(1, 2, DomainFlags::empty());
        let props: Vec<Box<dyn Propagator>> = vec![Box::new(NotEqual::new(x, y))];
        let mut graph = ConstraintGraph::new();
        graph.register(x, EventKind::Value, PropId::from_index(0), 0);
        graph.register(y, EventKind::Value, PropId::from_index(0), 0);

        let heuristics = HeuristicRegistry::default();
        let config = SolverConfig::default();
        let cancellation = CancellationFlag::new();
        let mut objective = ObjectiveManager::new(ObjectiveKind::Satisfaction);

        let result =
            dfs_search(&mut vars, &mut trail, &graph, &props, &[x, y], &heuristics, &mut objective, &config, &cancellation);

        assert_eq!(result.outcome, Outcome::Sat);
        let solution = &result.solutions[0];
        assert_ne!(solution[x], solution[y]);
    }

    #[test]
    fn dfs_search_reports_unsat_for_a_contradiction() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let x = vars.new_range(1, 1, DomainFlags::empty());
        let y = vars.new_range(1, 1, DomainFlags::empty());
        let props: Vec<Box<dyn Propagator>> = vec![Box::new(NotEqual::new(x, y))];
        let mut graph = ConstraintGraph::new();
        graph.register(x, EventKind::Value, PropId::from_index(0), 0);
        graph.register(y, EventKind::Value, PropId::from_index(0), 0);

        let heuristics = HeuristicRegistry::default();
        let config = SolverConfig::default();
        let cancellation = CancellationFlag::new();
        let mut objective = ObjectiveManager::new(ObjectiveKind::Satisfaction);

        let result =
            dfs_search(&mut vars, &mut trail, &graph, &props, &[x, y], &heuristics, &mut objective, &config, &cancellation);

        assert_eq!(result.outcome, Outcome::Unsat);
        assert!(result.solutions.is_empty());
    }

    #[test]
    fn cdcl_search_finds_a_satisfying_assignment() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let a = vars.new_boolean();
        let b = vars.new_boolean();
        let mut clauses = ClauseBase::new();
        let _ = clauses.add(vec![Literal::positive(a), Literal::positive(b)]);
        let _ = clauses.add(vec![Literal::negative(a), Literal::negative(b)]);

        let config = SolverConfig::default();
        let cancellation = CancellationFlag::new();
        let result = cdcl_search(&mut vars, &mut trail, &mut clauses, &[a, b], &config, &cancellation);

        assert_eq!(result.outcome, Outcome::Sat);
        let solution = &result.solutions[0];
        assert!(solution[a] == 1 || solution[b] == 1);
        assert!(!(solution[a] == 1 && solution[b] == 1));
    }

    #[test]
    fn cdcl_search_detects_unsat() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let a = vars.new_boolean();
        let mut clauses = ClauseBase::new();
        let _ = clauses.add(vec![Literal::positive(a)]);
        let _ = clauses.add(vec![Literal::negative(a)]);

        let config = SolverConfig::default();
        let cancellation = CancellationFlag::new();
        let result = cdcl_search(&mut vars, &mut trail, &mut clauses, &[a], &config, &cancellation);

        assert_eq!(result.outcome, Outcome::Unsat);
    }
}
