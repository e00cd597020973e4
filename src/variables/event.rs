//! Domain-change events.
//!
//! Every mutation of a variable's domain produces an [`Event`]. Value
//! events subsume range events, which subsume domain events: a propagator
//! registered for the weaker kind still wakes on the stronger one.

use super::domain::VarId;
use crate::propagators::PropId;

/// Strength of a domain change, from strongest to weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// The variable became fixed to a single value.
    Value,
    /// A bound (min and/or max) moved, without necessarily fixing the variable.
    Range,
    /// Some value was removed from the interior of the domain, without
    /// moving either bound.
    Domain,
}

impl EventKind {
    /// Whether a propagator registered for `trigger` wakes on `self`.
    ///
    /// `Value` implies both `Range` and `Domain`; `Range` implies `Domain`;
    /// `Domain` implies only itself.
    #[must_use]
    pub const fn satisfies(self, trigger: Self) -> bool {
        matches!(
            (self, trigger),
            (Self::Value, Self::Value | Self::Range | Self::Domain)
                | (Self::Range, Self::Range | Self::Domain)
                | (Self::Domain, Self::Domain)
        )
    }
}

/// One domain change, queued for the propagation engine to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// The variable that changed.
    pub var: VarId,
    /// How strong the change was.
    pub kind: EventKind,
    /// The propagator that caused the change, so it is not immediately
    /// re-woken by its own write (idempotence).
    pub cause: Option<PropId>,
}
