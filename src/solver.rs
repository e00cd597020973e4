//! The top-level programmatic surface: [`Solver`] ties the variable
//! store, propagation engine, search controllers, and listener framework
//! into the single entry point callers actually use.
//!
//! Grounded on the teacher crate's `Solver` facade (`lib.rs`): a builder
//! surface for declaring variables/constraints before search starts, then
//! one of a small family of `solve`-shaped methods that run a search
//! controller to completion and report an [`Outcome`].

use crate::core::config::SolverConfig;
use crate::core::error::{SolverError, SolverResult};
use crate::core::solution::SolveStats;
use crate::core::{CancellationFlag, Solution};
use crate::dimacs;
use crate::graph::ConstraintGraph;
use crate::listeners::{DecisionEvent, ListenerHandle, ListenerSet};
use crate::nogood::ClauseBase;
use crate::objective::{ObjectiveKind, ObjectiveManager, Outcome};
use crate::propagators::Propagator;
use crate::search::{cdcl_search, dfs_search, HeuristicRegistry};
use crate::trail::Trail;
use crate::variables::{DomainFlags, VarId, VarStore};

#[derive(Debug)]
enum Body {
    /// Arbitrary finite-domain propagators, searched with [`dfs_search`].
    General { props: Vec<Box<dyn Propagator>>, graph: ConstraintGraph, candidates: Vec<VarId> },
    /// Pure boolean/clausal problem (from [`Solver::from_dimacs`]),
    /// searched with [`cdcl_search`].
    Clausal { clauses: ClauseBase, bool_vars: Vec<VarId> },
}

/// Finite-domain constraint solver. Declare variables and propagators,
/// then call [`Solver::solve`], [`Solver::minimize`], or
/// [`Solver::maximize`].
#[derive(Debug)]
pub struct Solver {
    vars: VarStore,
    trail: Trail,
    body: Body,
    config: SolverConfig,
    heuristics: HeuristicRegistry,
    listeners: ListenerSet,
    cancellation: CancellationFlag,
    search_started: bool,
    solutions: Vec<Solution>,
    next_solution: usize,
    last_stats: SolveStats,
}

impl Solver {
    /// A solver with no variables or constraints posted yet, over the
    /// general propagator-based search path.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            vars: VarStore::new(),
            trail: Trail::new(),
            body: Body::General { props: Vec::new(), graph: ConstraintGraph::new(), candidates: Vec::new() },
            config,
            heuristics: HeuristicRegistry::default(),
            listeners: ListenerSet::new(),
            cancellation: CancellationFlag::new(),
            search_started: false,
            solutions: Vec::new(),
            next_solution: 0,
            last_stats: SolveStats::default(),
        }
    }

    /// Load a DIMACS CNF document and build a solver scoped to the
    /// boolean/clausal search path ([`cdcl_search`]).
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::DimacsParse`] if `text` is malformed.
    pub fn from_dimacs(text: &str, config: SolverConfig) -> SolverResult<Self> {
        let mut vars = VarStore::new();
        let instance = dimacs::parse(text, &mut vars)?;
        Ok(Self {
            vars,
            trail: Trail::new(),
            body: Body::Clausal { clauses: instance.clauses, bool_vars: instance.vars },
            config,
            heuristics: HeuristicRegistry::default(),
            listeners: ListenerSet::new(),
            cancellation: CancellationFlag::new(),
            search_started: false,
            solutions: Vec::new(),
            next_solution: 0,
            last_stats: SolveStats::default(),
        })
    }

    fn guard_not_started(&self, what: &'static str) -> SolverResult<()> {
        if self.search_started {
            Err(SolverError::PostAfterSearchStarted { what })
        } else {
            Ok(())
        }
    }

    /// Declare a boolean variable.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::PostAfterSearchStarted`] once search has run.
    pub fn new_boolean(&mut self) -> SolverResult<VarId> {
        self.guard_not_started("variable")?;
        let id = self.vars.new_boolean();
        self.register_candidate(id);
        Ok(id)
    }

    /// Declare a variable over the contiguous range `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::PostAfterSearchStarted`] once search has run,
    /// or [`SolverError::InvalidDomain`] if `min > max`.
    pub fn new_range(&mut self, min: i64, max: i64) -> SolverResult<VarId> {
        self.guard_not_started("variable")?;
        if min > max {
            return Err(SolverError::InvalidDomain { variable: "<new>".into(), message: format!("min {min} > max {max}") });
        }
        let id = self.vars.new_range(min, max, DomainFlags::empty());
        self.register_candidate(id);
        Ok(id)
    }

    /// Declare a variable over an arbitrary set of values.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::PostAfterSearchStarted`] once search has run.
    pub fn new_bitset(&mut self, values: &[i64]) -> SolverResult<VarId> {
        self.guard_not_started("variable")?;
        let id = self.vars.new_bitset(values);
        self.register_candidate(id);
        Ok(id)
    }

    /// Declare an affine view `scale * base + offset` over an existing
    /// direct variable.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::PostAfterSearchStarted`] once search has run.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is zero or `base` is itself a view.
    ///
    /// Views are not registered as branching candidates: search only
    /// ever decides directly on the owned variable backing a view.
    pub fn new_view(&mut self, base: VarId, scale: i64, offset: i64) -> SolverResult<VarId> {
        self.guard_not_started("variable")?;
        Ok(self.vars.new_view(base, scale, offset))
    }

    fn register_candidate(&mut self, id: VarId) {
        if let Body::General { candidates, .. } = &mut self.body {
            candidates.push(id);
        }
    }

    /// Post a propagator, wiring it into the constraint graph at the
    /// given priority (see [`Propagator::priority`]).
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::PostAfterSearchStarted`] once search has run,
    /// or propagates an error if this solver was built via
    /// [`Solver::from_dimacs`] (that path only accepts clauses, already
    /// loaded).
    pub fn post(&mut self, propagator: Box<dyn Propagator>) -> SolverResult<()> {
        self.guard_not_started("propagator")?;
        let vars = &self.vars;
        let Body::General { props, graph, .. } = &mut self.body else {
            return Err(SolverError::PostAfterSearchStarted { what: "propagator (DIMACS solver only accepts clauses)" });
        };
        let id = crate::propagators::PropId::from_index(props.len());
        for (pos, &var) in propagator.scope().iter().enumerate() {
            // Events are always reported against the base variable a view
            // forwards to (see `Context`), so dependents must be registered
            // under that same base id for a propagator scoped over a view
            // to ever be woken.
            graph.register(vars.base_of(var), propagator.trigger(pos), id, propagator.priority());
        }
        props.push(propagator);
        Ok(())
    }

    /// A clone of this solver's external cancellation handle. Call
    /// [`CancellationFlag::cancel`] on it from another thread to stop an
    /// in-progress search at the next safe point.
    #[must_use]
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Register a callback invoked with every solution found, in order.
    pub fn on_solution(&mut self, callback: impl FnMut(&Solution) + 'static) -> ListenerHandle {
        self.listeners.on_solution(callback)
    }

    /// Register a callback invoked once if the search proves
    /// unsatisfiable.
    pub fn on_failure(&mut self, callback: impl FnMut() + 'static) -> ListenerHandle {
        self.listeners.on_failure(callback)
    }

    /// Register a callback invoked on each restart (clausal search only).
    pub fn on_restart(&mut self, callback: impl FnMut(u64) + 'static) -> ListenerHandle {
        self.listeners.on_restart(callback)
    }

    /// Register a callback invoked on each branching decision (general
    /// search only; not fired for the clausal path).
    pub fn on_decision(&mut self, callback: impl FnMut(DecisionEvent) + 'static) -> ListenerHandle {
        self.listeners.on_decision(callback)
    }

    /// Remove a previously registered listener.
    pub fn remove_listener(&mut self, handle: ListenerHandle) {
        self.listeners.remove(handle);
    }

    /// Statistics from the most recent `solve`/`minimize`/`maximize` call.
    #[must_use]
    pub fn stats(&self) -> &SolveStats {
        &self.last_stats
    }

    fn run(&mut self, objective: ObjectiveKind) -> Outcome {
        self.search_started = true;
        let mut objective = ObjectiveManager::new(objective);

        let outcome = match &mut self.body {
            Body::General { props, graph, candidates } => {
                dfs_search(
                    &mut self.vars,
                    &mut self.trail,
                    graph,
                    props,
                    candidates,
                    &self.heuristics,
                    &mut objective,
                    &self.config,
                    &self.cancellation,
                )
            }
            Body::Clausal { clauses, bool_vars } => {
                cdcl_search(&mut self.vars, &mut self.trail, clauses, bool_vars, &self.config, &self.cancellation)
            }
        };

        self.last_stats = outcome.stats;
        self.solutions = outcome.solutions;
        self.next_solution = 0;
        if self.config.checked {
            for solution in &self.solutions {
                self.check_solution(solution);
            }
        }
        for solution in &self.solutions {
            self.listeners.notify_solution(solution);
        }
        if outcome.outcome == Outcome::Unsat {
            self.listeners.notify_failure();
        }
        outcome.outcome
    }

    /// Post-hoc verification of `solution` against every posted constraint,
    /// independent of the live domains that produced it. A failure here
    /// means this crate's own propagation narrowed inconsistently with its
    /// own `check` logic — logged, not surfaced as an `Err`, since it is a
    /// defect in this solver rather than in the caller's model.
    fn check_solution(&self, solution: &Solution) {
        match &self.body {
            Body::General { props, .. } => {
                for (idx, prop) in props.iter().enumerate() {
                    if !prop.check(&|v| solution[v]) {
                        tracing::error!(propagator = idx, "solution checker: posted propagator rejected its own solution");
                    }
                }
            }
            Body::Clausal { clauses, .. } => {
                for (id, clause) in clauses.iter() {
                    let satisfied = clause.literals.iter().any(|&lit| lit.is_satisfied_by(solution[lit.var()] == 1));
                    if !satisfied {
                        tracing::error!(clause = ?id, "solution checker: a clause is unsatisfied by its own solution");
                    }
                }
            }
        }
    }

    /// Find the first satisfying assignment, or prove none exists.
    pub fn solve(&mut self) -> Outcome {
        self.run(ObjectiveKind::Satisfaction)
    }

    /// Enumerate every satisfying assignment (as if `find_all` were set),
    /// regardless of the configured value.
    pub fn solve_all(&mut self) -> Outcome {
        self.config.find_all = true;
        self.run(ObjectiveKind::Enumerate)
    }

    /// Minimise `objective_var`, proving optimality if search is not cut
    /// short by a resource limit or cancellation.
    pub fn minimize(&mut self, objective_var: VarId) -> Outcome {
        self.run(ObjectiveKind::Minimize(objective_var))
    }

    /// Maximise `objective_var`.
    pub fn maximize(&mut self, objective_var: VarId) -> Outcome {
        self.run(ObjectiveKind::Maximize(objective_var))
    }

    /// Pop the next buffered solution from the most recent search call,
    /// `None` once exhausted.
    pub fn get_next_solution(&mut self) -> Option<&Solution> {
        let sol = self.solutions.get(self.next_solution)?;
        self.next_solution += 1;
        Some(sol)
    }

    /// Every solution captured by the most recent search call.
    #[must_use]
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }
}
