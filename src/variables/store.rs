//! The variable store: owns every domain and resolves views to their
//! backing variable.

use super::domain::{BitsetDomain, BoolDomain, Domain, DomainFlags, RangeDomain, VarId};
use super::event::EventKind;

/// An affine forwarding view: `value = scale * base + offset`.
///
/// `scale` is never zero; a negative scale mirrors the teacher crate's
/// `opposite`/`times_neg` view kinds, folded into one general transform
/// instead of a family of view structs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffineView {
    pub(crate) base: VarId,
    pub(crate) scale: i64,
    pub(crate) offset: i64,
}

impl AffineView {
    fn to_base(self, v: i64) -> i64 {
        // value = scale * base + offset  =>  base = (value - offset) / scale
        (v - self.offset) / self.scale
    }

    fn from_base(self, base_v: i64) -> i64 {
        self.scale * base_v + self.offset
    }
}

/// One entry in the variable store: either an owned domain or a view
/// forwarding to another entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// An owned, directly mutable domain.
    Direct { domain: Domain, flags: DomainFlags },
    /// A forwarding view; consolidated to point at a `Direct` variable.
    View(AffineView),
}

/// Result of attempting a domain-narrowing mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutateOutcome {
    /// The requested value(s) were already excluded; nothing changed.
    Unchanged,
    /// The domain narrowed; carries the strength of the resulting event.
    Changed(EventKind),
    /// The domain became empty.
    Failed,
}

/// Owns every variable's domain, indexed by [`VarId`].
#[derive(Debug, Clone, Default)]
pub struct VarStore {
    vars: Vec<Variable>,
}

impl VarStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    /// Number of declared variables (direct and view).
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variables have been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn push(&mut self, var: Variable) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(var);
        id
    }

    /// Declare a constant.
    pub fn new_constant(&mut self, value: i64) -> VarId {
        self.push(Variable::Direct { domain: Domain::Constant(value), flags: DomainFlags::empty() })
    }

    /// Declare a boolean variable.
    pub fn new_boolean(&mut self) -> VarId {
        self.push(Variable::Direct {
            domain: Domain::Boolean(BoolDomain::both()),
            flags: DomainFlags::empty(),
        })
    }

    /// Declare a contiguous range `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub fn new_range(&mut self, min: i64, max: i64, flags: DomainFlags) -> VarId {
        assert!(min <= max, "empty initial domain [{min}, {max}]");
        self.push(Variable::Direct { domain: Domain::Range(RangeDomain::new(min, max)), flags })
    }

    /// Declare a variable over an arbitrary, possibly sparse, set of values.
    pub fn new_bitset(&mut self, values: &[i64]) -> VarId {
        self.push(Variable::Direct {
            domain: Domain::Bitset(BitsetDomain::from_values(values)),
            flags: DomainFlags::REMOVABLE,
        })
    }

    /// Declare a view `scale * base + offset`.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is zero, or if `base` is itself a view (views are
    /// consolidated to point directly at a `Direct` variable at creation
    /// time; chaining is resolved by the caller before this is invoked).
    pub fn new_view(&mut self, base: VarId, scale: i64, offset: i64) -> VarId {
        assert_ne!(scale, 0, "view scale must be non-zero");
        assert!(matches!(self.vars[base.index()], Variable::Direct { .. }), "views must target a direct variable");
        self.push(Variable::View(AffineView { base, scale, offset }))
    }

    fn resolve(&self, id: VarId) -> (VarId, AffineView) {
        match self.vars[id.index()] {
            Variable::Direct { .. } => (id, AffineView { base: id, scale: 1, offset: 0 }),
            Variable::View(view) => (view.base, view),
        }
    }

    fn domain(&self, id: VarId) -> &Domain {
        match &self.vars[id.index()] {
            Variable::Direct { domain, .. } => domain,
            Variable::View(_) => unreachable!("resolve() must be used before reading a view's domain"),
        }
    }

    /// Lower bound of `id`'s current domain, expressed in `id`'s own units.
    #[must_use]
    pub fn min(&self, id: VarId) -> i64 {
        let (base, view) = self.resolve(id);
        let d = self.domain(base);
        if view.scale > 0 {
            view.from_base(d.min())
        } else {
            view.from_base(d.max())
        }
    }

    /// Upper bound of `id`'s current domain, expressed in `id`'s own units.
    #[must_use]
    pub fn max(&self, id: VarId) -> i64 {
        let (base, view) = self.resolve(id);
        let d = self.domain(base);
        if view.scale > 0 {
            view.from_base(d.max())
        } else {
            view.from_base(d.min())
        }
    }

    /// Whether `id`'s domain contains `value`.
    #[must_use]
    pub fn contains(&self, id: VarId, value: i64) -> bool {
        let (base, view) = self.resolve(id);
        if (value - view.offset) % view.scale != 0 {
            return false;
        }
        self.domain(base).contains(view.to_base(value))
    }

    /// Whether `id` is fixed to a single value.
    #[must_use]
    pub fn is_fixed(&self, id: VarId) -> bool {
        let (base, _) = self.resolve(id);
        self.domain(base).is_fixed()
    }

    /// Whether `id`'s domain is empty (search should treat this as failure).
    #[must_use]
    pub fn is_empty_domain(&self, id: VarId) -> bool {
        let (base, _) = self.resolve(id);
        self.domain(base).is_empty()
    }

    /// The direct variable backing `id` (itself, if `id` is already direct).
    #[must_use]
    pub fn base_of(&self, id: VarId) -> VarId {
        self.resolve(id).0
    }

    /// Snapshot the current domain of the *base* variable backing `id`,
    /// for use as a trail undo record. Views have no domain of their own,
    /// so the snapshot is always keyed by the base variable's id.
    #[must_use]
    pub fn snapshot(&self, id: VarId) -> (VarId, Domain) {
        let (base, _) = self.resolve(id);
        (base, self.domain(base).clone())
    }

    /// Restore a previously captured snapshot, undoing any mutation made
    /// to that base variable since.
    pub fn restore(&mut self, base: VarId, domain: Domain) {
        match &mut self.vars[base.index()] {
            Variable::Direct { domain: slot, .. } => *slot = domain,
            Variable::View(_) => unreachable!("snapshots are always keyed by a direct variable"),
        }
    }

    /// Narrow `id`'s domain to exactly `value`. Returns how strong the
    /// resulting event was, translating through any view transform.
    pub fn try_assign(&mut self, id: VarId, value: i64) -> MutateOutcome {
        let (base, view) = self.resolve(id);
        if (value - view.offset) % view.scale != 0 {
            return MutateOutcome::Failed;
        }
        let base_value = view.to_base(value);
        self.mutate_base(base, |d| match d {
            Domain::Constant(c) => {
                if *c == base_value {
                    MutateOutcome::Unchanged
                } else {
                    MutateOutcome::Failed
                }
            }
            Domain::Boolean(b) => {
                if !matches!(base_value, 0 | 1) {
                    return MutateOutcome::Failed;
                }
                let want = base_value == 1;
                if b.value() == Some(want) {
                    MutateOutcome::Unchanged
                } else if b.contains(want) {
                    *b = BoolDomain::fixed(want);
                    MutateOutcome::Changed(EventKind::Value)
                } else {
                    MutateOutcome::Failed
                }
            }
            Domain::Range(r) => {
                if base_value < r.min || base_value > r.max {
                    return MutateOutcome::Failed;
                }
                if r.is_fixed() {
                    return MutateOutcome::Unchanged;
                }
                *r = RangeDomain::new(base_value, base_value);
                MutateOutcome::Changed(EventKind::Value)
            }
            Domain::Bitset(b) => {
                if !b.contains(base_value) {
                    return MutateOutcome::Failed;
                }
                if b.size == 1 {
                    return MutateOutcome::Unchanged;
                }
                let kept = BitsetDomain::from_values(&[base_value]);
                *b = kept;
                MutateOutcome::Changed(EventKind::Value)
            }
        })
    }

    /// Remove `value` from `id`'s domain.
    pub fn try_remove(&mut self, id: VarId, value: i64) -> MutateOutcome {
        let (base, view) = self.resolve(id);
        if (value - view.offset) % view.scale != 0 {
            return MutateOutcome::Unchanged;
        }
        let base_value = view.to_base(value);
        self.mutate_base(base, |d| match d {
            Domain::Constant(c) => {
                if *c == base_value {
                    MutateOutcome::Failed
                } else {
                    MutateOutcome::Unchanged
                }
            }
            Domain::Boolean(b) => {
                if !matches!(base_value, 0 | 1) {
                    return MutateOutcome::Unchanged;
                }
                match b.without(base_value == 1) {
                    Some(next) => {
                        let changed = next != *b;
                        *b = next;
                        if changed { MutateOutcome::Changed(EventKind::Value) } else { MutateOutcome::Unchanged }
                    }
                    None => MutateOutcome::Failed,
                }
            }
            Domain::Range(r) => {
                if base_value < r.min || base_value > r.max {
                    return MutateOutcome::Unchanged;
                }
                if base_value == r.min {
                    *r = RangeDomain::new(r.min + 1, r.max);
                } else if base_value == r.max {
                    *r = RangeDomain::new(r.min, r.max - 1);
                } else {
                    // interior removal from a plain range is out of scope:
                    // callers must upgrade range-flagged-removable domains
                    // to bitset before calling try_remove on an interior value.
                    return MutateOutcome::Unchanged;
                }
                if r.is_empty() {
                    MutateOutcome::Failed
                } else if r.is_fixed() {
                    MutateOutcome::Changed(EventKind::Value)
                } else {
                    MutateOutcome::Changed(EventKind::Range)
                }
            }
            Domain::Bitset(b) => {
                let was_bound = !b.removal_is_interior(base_value);
                if !b.contains(base_value) {
                    return MutateOutcome::Unchanged;
                }
                if !b.remove(base_value) {
                    return MutateOutcome::Failed;
                }
                if b.size == 1 {
                    MutateOutcome::Changed(EventKind::Value)
                } else if was_bound {
                    MutateOutcome::Changed(EventKind::Range)
                } else {
                    MutateOutcome::Changed(EventKind::Domain)
                }
            }
        })
    }

    /// Raise `id`'s lower bound to at least `value`.
    pub fn try_set_min(&mut self, id: VarId, value: i64) -> MutateOutcome {
        let (base, view) = self.resolve(id);
        if view.scale > 0 {
            self.narrow_base_min(base, view.to_base_ceil(value, view.scale))
        } else {
            self.narrow_base_max(base, view.to_base_floor(value, view.scale))
        }
    }

    /// Lower `id`'s upper bound to at most `value`.
    pub fn try_set_max(&mut self, id: VarId, value: i64) -> MutateOutcome {
        let (base, view) = self.resolve(id);
        if view.scale > 0 {
            self.narrow_base_max(base, view.to_base_floor(value, view.scale))
        } else {
            self.narrow_base_min(base, view.to_base_ceil(value, view.scale))
        }
    }

    fn narrow_base_min(&mut self, base: VarId, bound: i64) -> MutateOutcome {
        self.mutate_base(base, |d| match d {
            Domain::Constant(c) => {
                if *c < bound {
                    MutateOutcome::Failed
                } else {
                    MutateOutcome::Unchanged
                }
            }
            Domain::Boolean(b) => {
                if bound <= 0 {
                    MutateOutcome::Unchanged
                } else if bound == 1 && b.contains(true) {
                    let changed = !b.is_fixed();
                    *b = BoolDomain::fixed(true);
                    if changed { MutateOutcome::Changed(EventKind::Value) } else { MutateOutcome::Unchanged }
                } else {
                    MutateOutcome::Failed
                }
            }
            Domain::Range(r) => {
                if bound <= r.min {
                    MutateOutcome::Unchanged
                } else if bound > r.max {
                    MutateOutcome::Failed
                } else {
                    *r = RangeDomain::new(bound, r.max);
                    if r.is_fixed() { MutateOutcome::Changed(EventKind::Value) } else { MutateOutcome::Changed(EventKind::Range) }
                }
            }
            Domain::Bitset(b) => {
                if bound <= b.min {
                    return MutateOutcome::Unchanged;
                }
                let mut v = b.min;
                while v < bound {
                    if !b.remove(v) {
                        return MutateOutcome::Failed;
                    }
                    v += 1;
                }
                if b.size == 1 { MutateOutcome::Changed(EventKind::Value) } else { MutateOutcome::Changed(EventKind::Range) }
            }
        })
    }

    fn narrow_base_max(&mut self, base: VarId, bound: i64) -> MutateOutcome {
        self.mutate_base(base, |d| match d {
            Domain::Constant(c) => {
                if *c > bound {
                    MutateOutcome::Failed
                } else {
                    MutateOutcome::Unchanged
                }
            }
            Domain::Boolean(b) => {
                if bound >= 1 {
                    MutateOutcome::Unchanged
                } else if bound == 0 && b.contains(false) {
                    let changed = !b.is_fixed();
                    *b = BoolDomain::fixed(false);
                    if changed { MutateOutcome::Changed(EventKind::Value) } else { MutateOutcome::Unchanged }
                } else {
                    MutateOutcome::Failed
                }
            }
            Domain::Range(r) => {
                if bound >= r.max {
                    MutateOutcome::Unchanged
                } else if bound < r.min {
                    MutateOutcome::Failed
                } else {
                    *r = RangeDomain::new(r.min, bound);
                    if r.is_fixed() { MutateOutcome::Changed(EventKind::Value) } else { MutateOutcome::Changed(EventKind::Range) }
                }
            }
            Domain::Bitset(b) => {
                if bound >= b.max {
                    return MutateOutcome::Unchanged;
                }
                let mut v = b.max;
                while v > bound {
                    if !b.remove(v) {
                        return MutateOutcome::Failed;
                    }
                    v -= 1;
                }
                if b.size == 1 { MutateOutcome::Changed(EventKind::Value) } else { MutateOutcome::Changed(EventKind::Range) }
            }
        })
    }

    fn mutate_base(&mut self, base: VarId, f: impl FnOnce(&mut Domain) -> MutateOutcome) -> MutateOutcome {
        match &mut self.vars[base.index()] {
            Variable::Direct { domain, .. } => f(domain),
            Variable::View(_) => unreachable!("resolve() always yields a direct base"),
        }
    }
}

impl AffineView {
    fn to_base_ceil(self, v: i64, scale: i64) -> i64 {
        let num = v - self.offset;
        num.div_euclid(scale) + i64::from(num.rem_euclid(scale) != 0)
    }

    fn to_base_floor(self, v: i64, scale: i64) -> i64 {
        let num = v - self.offset;
        num.div_euclid(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_and_remove_on_a_range_domain() {
        let mut store = VarStore::new();
        let x = store.new_range(1, 5, DomainFlags::empty());
        assert_eq!(store.try_remove(x, 1), MutateOutcome::Changed(EventKind::Range));
        assert_eq!(store.min(x), 2);
        assert_eq!(store.try_assign(x, 3), MutateOutcome::Changed(EventKind::Value));
        assert!(store.is_fixed(x));
    }

    #[test]
    fn negated_view_mirrors_bounds() {
        let mut store = VarStore::new();
        let x = store.new_range(1, 5, DomainFlags::empty());
        let neg_x = store.new_view(x, -1, 0);
        assert_eq!(store.min(neg_x), -5);
        assert_eq!(store.max(neg_x), -1);
        assert_eq!(store.try_set_min(neg_x, -3), MutateOutcome::Changed(EventKind::Range));
        // neg_x >= -3  <=>  x <= 3
        assert_eq!(store.max(x), 3);
    }

    #[test]
    fn shifted_view_translates_bounds() {
        let mut store = VarStore::new();
        let x = store.new_range(0, 10, DomainFlags::empty());
        let shifted = store.new_view(x, 1, 5); // shifted = x + 5
        assert_eq!(store.min(shifted), 5);
        assert_eq!(store.max(shifted), 15);
        assert_eq!(store.try_set_max(shifted, 12), MutateOutcome::Changed(EventKind::Range));
        assert_eq!(store.max(x), 7);
    }

    #[test]
    fn narrowing_to_empty_fails() {
        let mut store = VarStore::new();
        let x = store.new_range(1, 3, DomainFlags::empty());
        assert_eq!(store.try_set_min(x, 4), MutateOutcome::Failed);
    }
}
