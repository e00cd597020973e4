//! Variables and their domains.
//!
//! See [`domain`] for the domain representations (constant, boolean,
//! range, bitset), [`store`] for the owning arena that resolves views to
//! their backing variable, and [`event`] for the domain-change events
//! produced by mutation.

pub mod domain;
pub mod event;
pub mod store;

pub use domain::{BitsetDomain, BoolDomain, Domain, DomainFlags, RangeDomain, VarId};
pub use event::{Event, EventKind};
pub use store::{AffineView, MutateOutcome, VarStore, Variable};
