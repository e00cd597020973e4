//! A finite-domain constraint satisfaction solver.
//!
//! Variables live in a [`variables::VarStore`] behind stable [`variables::VarId`]
//! handles; constraints are posted as [`propagators::Propagator`] trait
//! objects wired into a [`graph::ConstraintGraph`]; a two-level fixpoint
//! ([`propagation`]) drains a variable-event queue into a priority-ordered
//! constraint queue until nothing more narrows. Every mutation is undone on
//! backtrack through a single reversible [`trail::Trail`]. Two search
//! controllers sit on top ([`search::dfs_search`] for arbitrary
//! finite-domain branching with scope-targeted backjumping,
//! [`search::cdcl_search`] for pure boolean/clausal problems with full
//! first-UIP nogood learning), coordinated through an
//! [`objective::ObjectiveManager`] and reported through
//! [`listeners::ListenerSet`].
//!
//! Most callers want [`Solver`], which wraps all of the above behind a
//! single builder-then-solve surface.

pub mod core;
pub mod dimacs;
pub mod graph;
pub mod listeners;
pub mod nogood;
pub mod objective;
pub mod propagation;
pub mod propagators;
pub mod queues;
pub mod search;
mod solver;
pub mod trail;
pub mod variables;

pub use core::{CancellationFlag, Solution, SolveStats, SolverConfig, SolverError, SolverResult, Verbosity};
pub use dimacs::CnfInstance;
pub use listeners::{DecisionEvent, ListenerHandle};
pub use objective::Outcome;
pub use solver::Solver;
pub use variables::VarId;
