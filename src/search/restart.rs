//! Restart schedules.

/// Which family of restart schedule to use. The base interval and growth
/// factor live on [`crate::core::config::SolverConfig`] rather than here,
/// so switching schedules doesn't require re-specifying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    /// Never restart; run to exhaustion or a resource limit.
    #[default]
    None,
    /// Conflict threshold grows geometrically: `base`, `base*factor`,
    /// `base*factor^2`, ...
    Geometric,
    /// Luby's sequence (1,1,2,1,1,2,4,...) scaled by `base`.
    Luby,
}

/// Tracks conflicts-since-last-restart against the configured schedule.
#[derive(Debug, Clone)]
pub struct RestartSchedule {
    policy: RestartPolicy,
    base: u64,
    factor: f64,
    conflicts_since_restart: u64,
    threshold: u64,
    luby_index: u64,
}

impl RestartSchedule {
    /// Build a schedule from the policy and parameters on
    /// [`crate::core::config::SolverConfig`].
    #[must_use]
    pub fn new(policy: RestartPolicy, base: u64, factor: f64) -> Self {
        // base 0 means "no restart" regardless of the configured policy.
        let policy = if base == 0 { RestartPolicy::None } else { policy };
        let threshold = match policy {
            RestartPolicy::None => u64::MAX,
            RestartPolicy::Geometric => base,
            RestartPolicy::Luby => base * luby(1),
        };
        Self { policy, base, factor, conflicts_since_restart: 0, threshold, luby_index: 1 }
    }

    /// Record one conflict. Returns `true` if the threshold was just
    /// reached, in which case the caller should restart and then call
    /// [`RestartSchedule::advance`].
    pub fn record_conflict(&mut self) -> bool {
        self.conflicts_since_restart += 1;
        self.conflicts_since_restart >= self.threshold
    }

    /// Reset the conflict counter and compute the next threshold, after
    /// the caller has actually performed the restart.
    pub fn advance(&mut self) {
        self.conflicts_since_restart = 0;
        match self.policy {
            RestartPolicy::None => {}
            RestartPolicy::Geometric => {
                self.threshold = ((self.threshold as f64) * self.factor).ceil() as u64;
            }
            RestartPolicy::Luby => {
                self.luby_index += 1;
                self.threshold = self.base * luby(self.luby_index);
            }
        }
    }
}

/// The `i`-th term (1-based) of Luby's sequence.
fn luby(i: u64) -> u64 {
    let mut k = 1;
    while (1u64 << k) - 1 < i {
        k += 1;
    }
    if i == (1u64 << k) - 1 {
        1u64 << (k - 1)
    } else {
        luby(i - (1u64 << (k - 1)) + 1)
    }
}
