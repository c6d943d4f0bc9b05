//! Hub (Videohub Ethernet protocol) block parser and command encoder.
//!
//! The hub does not send self-contained lines.  It sends *blocks*: a header
//! line ending in `:` followed by data lines.  Only two blocks matter here:
//!
//! ```text
//! INPUT LABELS:            ← exactly 16 lines follow, one per input
//! Camera 1
//! ...
//!
//! VIDEO OUTPUT ROUTING:    ← "<output> <input>" lines until anything else
//! 2 5
//!
//! ```
//!
//! # State machine
//!
//! | State              | Line                                   | Next state            | Event            |
//! |--------------------|----------------------------------------|-----------------------|------------------|
//! | `Idle`             | starts with `INPUT LABELS:`            | `AwaitingLabels{0}`   | –                |
//! | `Idle`             | starts with `VIDEO OUTPUT ROUTING:`    | `AwaitingRouting`     | –                |
//! | `Idle`             | anything else                          | `Idle`                | –                |
//! | `AwaitingLabels{n}`| any line                               | `n+1`, or `Idle` at 16| `Label`          |
//! | `AwaitingRouting`  | a header (as in `Idle`)                | that header's state   | –                |
//! | `AwaitingRouting`  | `<monitored> <input>`                  | `AwaitingRouting`     | `RoutingChanged` |
//! | `AwaitingRouting`  | anything else                          | `Idle`                | –                |
//!
//! Inside a label block every line is a label, even one that looks like a
//! header: the block length is fixed, not delimited.

use tracing::trace;

use crate::domain::input::{InputIndex, INPUT_COUNT};
use crate::protocol::error::ProtocolError;

/// Line sent once after every (re)connect.
pub const HUB_INIT: &str = "list\n";

const LABELS_HEADER: &str = "INPUT LABELS:";
const ROUTING_HEADER: &str = "VIDEO OUTPUT ROUTING:";

/// Where the parser is within the hub's block stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HubParserState {
    /// Scanning for a block header.
    #[default]
    Idle,
    /// Inside `INPUT LABELS:`; `next` is the input the next line names.
    AwaitingLabels { next: u8 },
    /// Inside `VIDEO OUTPUT ROUTING:`.
    AwaitingRouting,
}

/// Something the hub told us that the bridge must act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// The hub (re)announced the name of an input.
    Label { input: InputIndex, label: String },
    /// The monitored output is now fed by `input`.
    RoutingChanged(InputIndex),
}

/// Incremental parser for the hub's status stream.
///
/// Feed it one line at a time (without the trailing `\n`).
#[derive(Debug, Clone)]
pub struct HubParser {
    state: HubParserState,
    monitored_output: String,
}

impl HubParser {
    /// Creates a parser that reports routing changes for `monitored_output`.
    pub fn new(monitored_output: u16) -> Self {
        Self {
            state: HubParserState::Idle,
            monitored_output: monitored_output.to_string(),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> HubParserState {
        self.state
    }

    /// Drops any partially read block.  Used when the session is re-established.
    pub fn reset(&mut self) {
        self.state = HubParserState::Idle;
    }

    /// Consumes one line and returns the event it produced, if any.
    ///
    /// # Errors
    ///
    /// A routing line for the monitored output with an unusable input field
    /// yields a [`ProtocolError`].  The parser stays inside the routing block
    /// so that following lines are still read.
    pub fn feed(&mut self, line: &str) -> Result<Option<HubEvent>, ProtocolError> {
        let line = line.trim_end_matches('\r');

        match self.state {
            HubParserState::AwaitingLabels { next } => {
                let following = next + 1;
                self.state = if following as usize >= INPUT_COUNT {
                    HubParserState::Idle
                } else {
                    HubParserState::AwaitingLabels { next: following }
                };
                // `next` is always below INPUT_COUNT by construction.
                let input = InputIndex::new(next).unwrap_or_default();
                Ok(Some(HubEvent::Label {
                    input,
                    label: line.to_string(),
                }))
            }
            HubParserState::Idle | HubParserState::AwaitingRouting => {
                if line.starts_with(LABELS_HEADER) {
                    self.transition(HubParserState::AwaitingLabels { next: 0 });
                    return Ok(None);
                }
                if line.starts_with(ROUTING_HEADER) {
                    self.transition(HubParserState::AwaitingRouting);
                    return Ok(None);
                }
                if self.state == HubParserState::AwaitingRouting {
                    return self.routing_line(line);
                }
                Ok(None)
            }
        }
    }

    fn routing_line(&mut self, line: &str) -> Result<Option<HubEvent>, ProtocolError> {
        let mut fields = line.split_whitespace();
        let (Some(output), Some(input), None) = (fields.next(), fields.next(), fields.next())
        else {
            self.transition(HubParserState::Idle);
            return Ok(None);
        };
        if output != self.monitored_output {
            self.transition(HubParserState::Idle);
            return Ok(None);
        }

        let raw: u32 = input
            .parse()
            .map_err(|_| ProtocolError::MalformedRoutingIndex(input.to_string()))?;
        let index = u8::try_from(raw)
            .ok()
            .and_then(InputIndex::new)
            .ok_or(ProtocolError::InputOutOfRange(raw))?;
        Ok(Some(HubEvent::RoutingChanged(index)))
    }

    fn transition(&mut self, to: HubParserState) {
        trace!("hub parser: {:?} → {:?}", self.state, to);
        self.state = to;
    }
}

/// Encodes a routing-set command for the hub.
///
/// # Examples
///
/// ```rust
/// use xpoint_core::protocol::encode_crosspoint;
/// use xpoint_core::InputIndex;
///
/// let cmd = encode_crosspoint(2, InputIndex::new(5).unwrap());
/// assert_eq!(cmd, "VIDEO OUTPUT ROUTING:\n2 5\n\n");
/// ```
pub fn encode_crosspoint(output: u16, input: InputIndex) -> String {
    format!("{ROUTING_HEADER}\n{output} {input}\n\n")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
