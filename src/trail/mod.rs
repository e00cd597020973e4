//! The reversible trail.
//!
//! Every piece of mutable state touched during search — variable domains,
//! and the small scraps of reversible bookkeeping propagators keep for
//! themselves (counters, watch lists, cached partial results) — is undone
//! on backtrack by replaying records off this trail, in strict LIFO order,
//! back to a saved level. Five independent sub-stacks are kept so that the
//! common cases (domain snapshots, reversible integers and booleans) avoid
//! the boxing/downcasting overhead the rarer cases (reversible lists,
//! opaque constraint state) require.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::variables::{Domain, VarId, VarStore};

/// Something a propagator can snapshot and later restore without the
/// trail knowing its concrete type.
pub trait Reversible: fmt::Debug {
    /// Capture the current value.
    fn save(&self) -> Box<dyn Any>;
    /// Overwrite the current value with a previously captured snapshot.
    fn restore(&self, saved: Box<dyn Any>);
}

/// A reversible integer cell, for propagator-local counters.
#[derive(Debug, Clone)]
pub struct RevInt(Rc<Cell<i64>>);

impl RevInt {
    /// A new cell holding `value`, not yet tracked by any trail.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> i64 {
        self.0.get()
    }

    /// Overwrite the value, recording the old one on `trail` so it is
    /// restored on backtrack past the current level.
    pub fn set(&self, trail: &mut Trail, value: i64) {
        if value == self.0.get() {
            return;
        }
        trail.int_stack.push((self.0.clone(), self.0.get()));
        self.0.set(value);
    }
}

/// A reversible boolean cell, for propagator-local flags.
#[derive(Debug, Clone)]
pub struct RevBool(Rc<Cell<bool>>);

impl RevBool {
    /// A new cell holding `value`.
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> bool {
        self.0.get()
    }

    /// Overwrite the value, recording the old one on `trail`.
    pub fn set(&self, trail: &mut Trail, value: bool) {
        if value == self.0.get() {
            return;
        }
        trail.bool_stack.push((self.0.clone(), self.0.get()));
        self.0.set(value);
    }
}

/// A reversible container for arbitrary propagator-local state
/// (watch lists, partial supports, ...), snapshotted wholesale.
#[derive(Debug)]
pub struct RevCell<T>(std::cell::RefCell<T>);

impl<T: Clone + fmt::Debug + 'static> RevCell<T> {
    /// A new cell holding `value`.
    #[must_use]
    pub fn new(value: T) -> Rc<Self> {
        Rc::new(Self(std::cell::RefCell::new(value)))
    }

    /// Borrow the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }

    /// Overwrite the value, recording the old one on `trail`'s list stack.
    pub fn set(self: &Rc<Self>, trail: &mut Trail, value: T) {
        let old = self.0.borrow().clone();
        trail.list_stack.push((self.clone() as Rc<dyn Reversible>, Box::new(old)));
        *self.0.borrow_mut() = value;
    }
}

impl<T: Clone + fmt::Debug + 'static> Reversible for RevCell<T> {
    fn save(&self) -> Box<dyn Any> {
        Box::new(self.0.borrow().clone())
    }

    fn restore(&self, saved: Box<dyn Any>) {
        if let Ok(value) = saved.downcast::<T>() {
            *self.0.borrow_mut() = *value;
        }
    }
}

/// Lengths of each sub-stack at the moment a level was opened.
#[derive(Debug, Clone, Copy, Default)]
struct TrailHeader {
    domain: usize,
    bool_len: usize,
    int_len: usize,
    list_len: usize,
    constraint_len: usize,
}

/// Which variables already hold a domain undo record within one level's
/// window, so a second narrowing of the same variable at the same level
/// updates the domain in place instead of piling up another record.
#[derive(Debug, Clone, Default)]
struct TouchedVars(Vec<bool>);

impl TouchedVars {
    /// Mark `var` as recorded at this level. Returns whether it was
    /// already marked (i.e. whether the caller should skip pushing a new
    /// record).
    fn mark(&mut self, var: VarId) -> bool {
        let idx = var.index();
        if idx >= self.0.len() {
            self.0.resize(idx + 1, false);
        }
        std::mem::replace(&mut self.0[idx], true)
    }
}

/// The reversible trail, covering five independent kinds of undo record.
#[derive(Debug, Default)]
pub struct Trail {
    domain_stack: Vec<(VarId, Domain)>,
    bool_stack: Vec<(Rc<Cell<bool>>, bool)>,
    int_stack: Vec<(Rc<Cell<i64>>, i64)>,
    list_stack: Vec<(Rc<dyn Reversible>, Box<dyn Any>)>,
    constraint_stack: Vec<(Rc<dyn Reversible>, Box<dyn Any>)>,
    headers: Vec<TrailHeader>,
    /// One entry per open level plus the base (unlevelled) window, so
    /// `touched.len() == headers.len() + 1` always holds.
    touched: Vec<TouchedVars>,
}

impl Trail {
    /// A fresh trail, at level 0 with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self { touched: vec![TouchedVars::default()], ..Self::default() }
    }

    /// Current decision level (number of open `push_level` calls).
    #[must_use]
    pub fn level(&self) -> usize {
        self.headers.len()
    }

    /// Open a new backtrack level. Every record pushed after this call is
    /// undone by the matching [`Trail::restore_to`] down to this level.
    pub fn push_level(&mut self) {
        self.headers.push(TrailHeader {
            domain: self.domain_stack.len(),
            bool_len: self.bool_stack.len(),
            int_len: self.int_stack.len(),
            list_len: self.list_stack.len(),
            constraint_len: self.constraint_stack.len(),
        });
        self.touched.push(TouchedVars::default());
    }

    /// Record that `var`'s domain was about to change from `old`.
    /// Must be called *before* the mutation is applied. A variable already
    /// recorded within the current level's window is not recorded again —
    /// the existing record already holds the domain from before this
    /// level started, which is what restoring past this level needs.
    pub fn record_domain(&mut self, var: VarId, old: Domain) {
        let current = self.touched.last_mut().expect("touched always has at least the base window");
        if current.mark(var) {
            return;
        }
        self.domain_stack.push((var, old));
    }

    /// Record opaque, propagator-owned state for the constraint-state
    /// sub-stack (kept distinct from the list sub-stack purely so the two
    /// kinds of bookkeeping can be reasoned about and sized separately).
    pub fn record_constraint_state(&mut self, cell: Rc<dyn Reversible>) {
        let saved = cell.save();
        self.constraint_stack.push((cell, saved));
    }

    /// Undo every record back to `level`, restoring `vars` along the way,
    /// and close every level above it.
    pub fn restore_to(&mut self, level: usize, vars: &mut VarStore) {
        while self.headers.len() > level {
            let header = self.headers.pop().expect("level checked above");

            while self.domain_stack.len() > header.domain {
                let (var, old) = self.domain_stack.pop().expect("length checked above");
                vars.restore(var, old);
            }
            while self.bool_stack.len() > header.bool_len {
                let (cell, old) = self.bool_stack.pop().expect("length checked above");
                cell.set(old);
            }
            while self.int_stack.len() > header.int_len {
                let (cell, old) = self.int_stack.pop().expect("length checked above");
                cell.set(old);
            }
            while self.list_stack.len() > header.list_len {
                let (cell, saved) = self.list_stack.pop().expect("length checked above");
                cell.restore(saved);
            }
            while self.constraint_stack.len() > header.constraint_len {
                let (cell, saved) = self.constraint_stack.pop().expect("length checked above");
                cell.restore(saved);
            }

            self.touched.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::DomainFlags;

    #[test]
    fn domain_changes_undo_in_lifo_order() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 10, DomainFlags::empty());
        let mut trail = Trail::new();

        trail.push_level();
        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 5);
        assert_eq!(vars.min(x), 5);

        trail.restore_to(0, &mut vars);
        assert_eq!(vars.min(x), 1);
        assert_eq!(trail.level(), 0);
    }

    #[test]
    fn nested_levels_restore_independently() {
        let mut vars = VarStore::new();
        let x = vars.new_range(0, 100, DomainFlags::empty());
        let mut trail = Trail::new();

        trail.push_level();
        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 10);

        trail.push_level();
        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 20);
        assert_eq!(vars.min(x), 20);

        trail.restore_to(1, &mut vars);
        assert_eq!(vars.min(x), 10);
        assert_eq!(trail.level(), 1);

        trail.restore_to(0, &mut vars);
        assert_eq!(vars.min(x), 0);
        assert_eq!(trail.level(), 0);
    }

    #[test]
    fn rev_int_and_rev_bool_undo_through_trail() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let counter = RevInt::new(0);
        let flag = RevBool::new(false);

        trail.push_level();
        counter.set(&mut trail, 5);
        flag.set(&mut trail, true);
        assert_eq!(counter.get(), 5);
        assert!(flag.get());

        trail.restore_to(0, &mut vars);
        assert_eq!(counter.get(), 0);
        assert!(!flag.get());
    }

    #[test]
    fn repeated_narrowing_of_the_same_variable_at_one_level_keeps_a_single_record() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 10, DomainFlags::empty());
        let mut trail = Trail::new();

        trail.push_level();
        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 3);

        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 5);

        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 7);
        assert_eq!(vars.min(x), 7);

        assert_eq!(trail.domain_stack.len(), 1, "one level, one narrowing variable, exactly one undo record");

        trail.restore_to(0, &mut vars);
        assert_eq!(vars.min(x), 1, "restoring past the level undoes all three narrowings at once");
    }

    #[test]
    fn a_level_reusing_a_numeric_depth_does_not_see_a_stale_touched_mark() {
        let mut vars = VarStore::new();
        let x = vars.new_range(1, 10, DomainFlags::empty());
        let mut trail = Trail::new();

        trail.push_level();
        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 4);
        trail.restore_to(0, &mut vars);
        assert_eq!(vars.min(x), 1);

        trail.push_level();
        let (base, old) = vars.snapshot(x);
        trail.record_domain(base, old);
        let _ = vars.try_set_min(x, 9);
        assert_eq!(trail.domain_stack.len(), 1, "the new level's window starts with nothing touched");

        trail.restore_to(0, &mut vars);
        assert_eq!(vars.min(x), 1);
    }

    #[test]
    fn rev_cell_undoes_wholesale_snapshots() {
        let mut vars = VarStore::new();
        let mut trail = Trail::new();
        let watch_list: Rc<RevCell<Vec<u32>>> = RevCell::new(vec![1, 2, 3]);

        trail.push_level();
        watch_list.set(&mut trail, vec![1, 2]);
        assert_eq!(watch_list.get(), vec![1, 2]);

        trail.restore_to(0, &mut vars);
        assert_eq!(watch_list.get(), vec![1, 2, 3]);
    }
}
