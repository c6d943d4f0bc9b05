//! Errors raised while parsing inbound lines or encoding outbound commands.
//!
//! None of these are fatal to a link.  The offending line or command is
//! dropped and the session carries on.

use thiserror::Error;

/// Errors that can occur while decoding a device line or encoding a command.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// A button-down line whose id is not a number.
    #[error("malformed button id in panel line: {0:?}")]
    MalformedButtonId(String),

    /// A button-down line whose id has more than one digit.
    ///
    /// The panel protocol as deployed addresses input buttons with a single
    /// ASCII digit.  Longer ids are rejected instead of being truncated.
    #[error("unsupported multi-digit button id: {0:?}")]
    UnsupportedButtonId(String),

    /// A routing line for the monitored output whose input field is not a number.
    #[error("malformed input index in routing line: {0:?}")]
    MalformedRoutingIndex(String),

    /// A routing line naming an input the bridge does not track.
    #[error("input index {0} is out of range (0..=15)")]
    InputOutOfRange(u32),

    /// A panel command could not be serialised to JSON.
    #[error("failed to encode panel command: {0}")]
    Encode(String),
}
