//! Exponential reconnect schedule.

use std::time::Duration;

use crate::domain::ReconnectPolicy;

/// Produces successive reconnect delays for one link.
///
/// The first delay is `initial_delay`; each following delay is multiplied by
/// `multiplier` and capped at `max_delay`.  [`Backoff::reset`] starts over
/// and is called once a session is established.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    next: Duration,
}

impl Backoff {
    /// Creates a schedule starting at `policy.initial_delay`.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            next: policy.initial_delay.min(policy.max_delay),
            policy,
        }
    }

    /// Returns the delay to wait now and advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = delay
            .saturating_mul(self.policy.multiplier.max(1))
            .min(self.policy.max_delay);
        delay
    }

    /// Restarts the schedule from `initial_delay`.
    pub fn reset(&mut self) {
        self.next = self.policy.initial_delay.min(self.policy.max_delay);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
