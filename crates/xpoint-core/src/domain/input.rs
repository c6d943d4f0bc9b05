//! Input indices and the fixed mapping between panel buttons and hub inputs.
//!
//! The hub numbers its inputs from zero.  The panel numbers its hardware
//! components ("HWCs") from one, and on the panels this bridge was built for
//! the input buttons start at a fixed position in that numbering.  The gap
//! between the two schemes is a single constant offset, captured by
//! [`ButtonMap`].

use std::fmt;

/// Number of hub inputs the bridge tracks.
pub const INPUT_COUNT: usize = 16;

/// Offset used when none is configured: HWC id 1 is input 0.
pub const DEFAULT_HWC_OFFSET: u8 = 1;

/// A zero-based hub input index, guaranteed to be below [`INPUT_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InputIndex(u8);

impl InputIndex {
    /// Returns `Some` if `value` addresses one of the tracked inputs.
    pub fn new(value: u8) -> Option<Self> {
        if (value as usize) < INPUT_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the raw zero-based index.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Returns the index as a slot position for array lookups.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Iterates over every tracked input in ascending order.
    pub fn all() -> impl Iterator<Item = InputIndex> {
        (0..INPUT_COUNT as u8).map(InputIndex)
    }
}

impl fmt::Display for InputIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A panel hardware component id (one-based, as used on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HwcId(pub u16);

impl fmt::Display for HwcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Linear mapping between panel HWC ids and hub input indices.
///
/// `input = hwc - offset` and `hwc = input + offset`.  The same offset is
/// used in both directions so that the button a user presses is the button
/// that lights up once the hub confirms the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonMap {
    offset: u8,
}

impl ButtonMap {
    /// Creates a mapping with the given offset.
    pub fn new(offset: u8) -> Self {
        Self { offset }
    }

    /// Returns the input a button addresses, or `None` if the button sits
    /// below the offset or past the last tracked input.
    pub fn input_for(&self, hwc: HwcId) -> Option<InputIndex> {
        let index = hwc.0.checked_sub(self.offset as u16)?;
        u8::try_from(index).ok().and_then(InputIndex::new)
    }

    /// Returns the button that displays the given input.
    pub fn hwc_for(&self, input: InputIndex) -> HwcId {
        HwcId(input.0 as u16 + self.offset as u16)
    }
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self::new(DEFAULT_HWC_OFFSET)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
