//! Routing state for the one monitored hub output.
//!
//! Two reader loops run concurrently in the bridge, and both can end up
//! touching this value.  The only mutation is [`RoutingState::apply`], which
//! reads the previous input and stores the new one inside a single critical
//! section.  Two overlapping routing changes can therefore never observe the
//! same `previous` input.

use std::sync::{Mutex, MutexGuard};

use crate::domain::input::InputIndex;

/// The outcome of one accepted routing change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingChange {
    /// Input that fed the monitored output before this change.
    pub previous: InputIndex,
    /// Input that feeds it now.
    pub current: InputIndex,
}

impl RoutingChange {
    /// Returns `true` if the hub re-announced the route that was already active.
    pub fn is_unchanged(&self) -> bool {
        self.previous == self.current
    }
}

/// The input currently routed to the monitored output.
///
/// Starts at input 0: the bridge has no way to know the real route until the
/// hub's first routing broadcast, and the panel is cleared at connect anyway.
#[derive(Debug, Default)]
pub struct RoutingState {
    current: Mutex<InputIndex>,
}

impl RoutingState {
    /// Creates a state with input 0 active.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the currently active input.
    pub fn current(&self) -> InputIndex {
        *self.lock()
    }

    /// Returns `true` if `input` is the active one.
    pub fn is_active(&self, input: InputIndex) -> bool {
        self.current() == input
    }

    /// Stores `new` as the active input and returns what it replaced.
    ///
    /// The read of the old value and the write of the new value happen under
    /// one lock acquisition.
    pub fn apply(&self, new: InputIndex) -> RoutingChange {
        let mut current = self.lock();
        let previous = std::mem::replace(&mut *current, new);
        RoutingChange {
            previous,
            current: new,
        }
    }

    fn lock(&self) -> MutexGuard<'_, InputIndex> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
