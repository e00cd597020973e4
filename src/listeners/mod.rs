//! Search-event listeners.
//!
//! Callers subscribe to solution/restart/decision/failure events and get
//! back a [`ListenerHandle`] that removes their callback in O(1) (a slot
//! index into a growable vector, left `None` once removed, the same shape
//! the teacher crate uses for its own dense id-indexed collections).

use crate::core::solution::Solution;
use crate::variables::VarId;

/// A decision the search is about to try, reported before propagation runs.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEvent {
    /// The variable being branched on.
    pub variable: VarId,
    /// The value or bound involved.
    pub value: i64,
    /// Current search-tree depth (decision-stack length after this push).
    pub depth: usize,
}

/// One registered callback slot, generic over the event payload type.
struct Slot<F: ?Sized> {
    callback: Option<Box<F>>,
}

/// O(1)-removable handle into one of a [`ListenerSet`]'s callback lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle {
    channel: Channel,
    index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Solution,
    Restart,
    Failure,
    Decision,
}

/// Every callback list a search run can notify.
#[derive(Default)]
pub struct ListenerSet {
    solution: Vec<Slot<dyn FnMut(&Solution)>>,
    restart: Vec<Slot<dyn FnMut(u64)>>,
    failure: Vec<Slot<dyn FnMut()>>,
    decision: Vec<Slot<dyn FnMut(DecisionEvent)>>,
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("solution", &self.solution.len())
            .field("restart", &self.restart.len())
            .field("failure", &self.failure.len())
            .field("decision", &self.decision.len())
            .finish()
    }
}

impl ListenerSet {
    /// An empty set, with no subscribers on any channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every solution found.
    pub fn on_solution(&mut self, callback: impl FnMut(&Solution) + 'static) -> ListenerHandle {
        self.solution.push(Slot { callback: Some(Box::new(callback)) });
        ListenerHandle { channel: Channel::Solution, index: self.solution.len() - 1 }
    }

    /// Subscribe to every restart.
    pub fn on_restart(&mut self, callback: impl FnMut(u64) + 'static) -> ListenerHandle {
        self.restart.push(Slot { callback: Some(Box::new(callback)) });
        ListenerHandle { channel: Channel::Restart, index: self.restart.len() - 1 }
    }

    /// Subscribe to every search-tree failure (domain wipe-out).
    pub fn on_failure(&mut self, callback: impl FnMut() + 'static) -> ListenerHandle {
        self.failure.push(Slot { callback: Some(Box::new(callback)) });
        ListenerHandle { channel: Channel::Failure, index: self.failure.len() - 1 }
    }

    /// Subscribe to every branching decision.
    pub fn on_decision(&mut self, callback: impl FnMut(DecisionEvent) + 'static) -> ListenerHandle {
        self.decision.push(Slot { callback: Some(Box::new(callback)) });
        ListenerHandle { channel: Channel::Decision, index: self.decision.len() - 1 }
    }

    /// Remove a previously registered callback. Removing an already-removed
    /// or unknown handle is a no-op.
    pub fn remove(&mut self, handle: ListenerHandle) {
        let slot = match handle.channel {
            Channel::Solution => self.solution.get_mut(handle.index).map(|s| &mut s.callback),
            Channel::Restart => self.restart.get_mut(handle.index).map(|s| &mut s.callback),
            Channel::Failure => self.failure.get_mut(handle.index).map(|s| &mut s.callback),
            Channel::Decision => self.decision.get_mut(handle.index).map(|s| &mut s.callback),
        };
        if let Some(slot) = slot {
            *slot = None;
        }
    }

    /// Notify every live solution subscriber.
    pub fn notify_solution(&mut self, solution: &Solution) {
        for slot in &mut self.solution {
            if let Some(cb) = slot.callback.as_mut() {
                cb(solution);
            }
        }
    }

    /// Notify every live restart subscriber.
    pub fn notify_restart(&mut self, restart_count: u64) {
        for slot in &mut self.restart {
            if let Some(cb) = slot.callback.as_mut() {
                cb(restart_count);
            }
        }
    }

    /// Notify every live failure subscriber.
    pub fn notify_failure(&mut self) {
        for slot in &mut self.failure {
            if let Some(cb) = slot.callback.as_mut() {
                cb();
            }
        }
    }

    /// Notify every live decision subscriber.
    pub fn notify_decision(&mut self, event: DecisionEvent) {
        for slot in &mut self.decision {
            if let Some(cb) = slot.callback.as_mut() {
                cb(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn removed_listener_stops_receiving_events() {
        let calls = Rc::new(RefCell::new(0));
        let mut set = ListenerSet::new();
        let counted = calls.clone();
        let handle = set.on_failure(move || *counted.borrow_mut() += 1);

        set.notify_failure();
        assert_eq!(*calls.borrow(), 1);

        set.remove(handle);
        set.notify_failure();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn solution_listener_receives_the_captured_solution() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut set = ListenerSet::new();
        let recorded = seen.clone();
        let _handle = set.on_solution(move |sol| recorded.borrow_mut().push(sol.len()));

        let solution = Solution::capture(3, |v| v.index() as i64);
        set.notify_solution(&solution);
        assert_eq!(*seen.borrow(), vec![3]);
    }
}
