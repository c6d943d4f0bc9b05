//! Last-known human-readable names of the hub inputs.
//!
//! The hub broadcasts all sixteen labels as one block whenever it connects
//! or an operator renames an input.  Each broadcast overwrites the slots
//! wholesale; there is no merging and no change detection.

use std::sync::{Mutex, MutexGuard};

use crate::domain::input::{InputIndex, INPUT_COUNT};

/// Sixteen label slots behind a single lock.
///
/// The lock is only ever held for one get or set, never across I/O.
#[derive(Debug, Default)]
pub struct LabelStore {
    slots: Mutex<[String; INPUT_COUNT]>,
}

impl LabelStore {
    /// Creates a store with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the label for `input` (empty if never set).
    pub fn get(&self, input: InputIndex) -> String {
        self.lock()[input.as_usize()].clone()
    }

    /// Overwrites the label for `input`.
    pub fn set(&self, input: InputIndex, label: impl Into<String>) {
        self.lock()[input.as_usize()] = label.into();
    }

    /// Returns every slot that holds a non-empty label, in input order.
    pub fn labelled(&self) -> Vec<(InputIndex, String)> {
        let slots = self.lock();
        InputIndex::all()
            .zip(slots.iter())
            .filter(|(_, label)| !label.is_empty())
            .map(|(input, label)| (input, label.clone()))
            .collect()
    }

    /// Returns a copy of all sixteen slots.
    pub fn snapshot(&self) -> [String; INPUT_COUNT] {
        self.lock().clone()
    }

    // A panic while holding the lock cannot leave a half-written `String`
    // behind, so a poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, [String; INPUT_COUNT]> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
