//! Panel protocol: button events in, LED and label commands out.
//!
//! Wire format (ASCII, one message per `\n`-terminated line):
//!
//! ```text
//! panel → bridge:  HWC#<id>=Down
//! bridge → panel:  list
//!                  Clear
//!                  {"HWCIDs":[<id>],"HWCMode":{"State":4},...}
//! ```
//!
//! The panel emits many other line types (`=Up`, encoder turns, pings,
//! replies to `list`).  They are ignored so that new firmware cannot break
//! the bridge.

use serde::Serialize;

use crate::domain::input::HwcId;
use crate::protocol::error::ProtocolError;

/// Lines sent once after every (re)connect, in order.
pub const PANEL_INIT: [&str; 2] = ["list\n", "Clear\n"];

const BUTTON_PREFIX: &str = "HWC#";
const DOWN_SUFFIX: &str = "=Down";

/// `HWCMode.State` for a lit button on the active route.
const STATE_ACTIVE: u8 = 4;
/// `HWCMode.State` for an unlit button.
const STATE_INACTIVE: u8 = 0;
/// Colour palette entry used for both states.
const COLOR_INDEX: u8 = 4;
/// Text formatting mode for the button display.
const TEXT_FORMATTING: u8 = 7;

/// Events the bridge cares about from the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// A momentary button went down.
    ButtonDown(HwcId),
}

/// Parses one line received from the panel.
///
/// Returns `Ok(None)` for lines that are not button-down events.
///
/// # Errors
///
/// A line of the form `HWC#<id>=Down` whose id is not a single decimal
/// digit yields a [`ProtocolError`].
///
/// # Examples
///
/// ```rust
/// use xpoint_core::protocol::{parse_panel_line, PanelEvent};
/// use xpoint_core::HwcId;
///
/// assert_eq!(
///     parse_panel_line("HWC#3=Down").unwrap(),
///     Some(PanelEvent::ButtonDown(HwcId(3)))
/// );
/// assert_eq!(parse_panel_line("HWC#3=Up").unwrap(), None);
/// ```
pub fn parse_panel_line(line: &str) -> Result<Option<PanelEvent>, ProtocolError> {
    let line = line.trim_end_matches('\r');
    let Some(id) = line
        .strip_prefix(BUTTON_PREFIX)
        .and_then(|rest| rest.strip_suffix(DOWN_SUFFIX))
    else {
        return Ok(None);
    };

    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::MalformedButtonId(id.to_string()));
    }
    if id.len() > 1 {
        return Err(ProtocolError::UnsupportedButtonId(id.to_string()));
    }

    let digit = (id.as_bytes()[0] - b'0') as u16;
    Ok(Some(PanelEvent::ButtonDown(HwcId(digit))))
}

// ── Outbound commands ─────────────────────────────────────────────────────────

/// A command the bridge sends to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    /// Light (`on = true`) or darken a button.
    SetLed { hwc: HwcId, on: bool },
    /// Show `INPUT <label>` on a button's display.
    SetLabel { hwc: HwcId, label: String },
}

impl PanelCommand {
    /// Encodes the command as one JSON object followed by `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if JSON serialisation fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use xpoint_core::{HwcId, PanelCommand};
    ///
    /// let line = PanelCommand::SetLabel { hwc: HwcId(2), label: "CAM".into() }
    ///     .encode()
    ///     .unwrap();
    /// assert_eq!(line, "{\"HWCIDs\":[2],\"HWCText\":{\"Formatting\":7,\"Textline1\":\"INPUT CAM\"}}\n");
    /// ```
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let json = match self {
            PanelCommand::SetLed { hwc, on } => serde_json::to_string(&LedJson {
                hwc_ids: [hwc.0],
                mode: ModeJson {
                    state: if *on { STATE_ACTIVE } else { STATE_INACTIVE },
                },
                color: ColorJson {
                    color_index: ColorIndexJson { index: COLOR_INDEX },
                },
                extended: ExtendedJson {},
                text: TextJson {
                    formatting: TEXT_FORMATTING,
                    textline1: None,
                },
            }),
            PanelCommand::SetLabel { hwc, label } => serde_json::to_string(&LabelJson {
                hwc_ids: [hwc.0],
                text: TextJson {
                    formatting: TEXT_FORMATTING,
                    textline1: Some(format!("INPUT {label}")),
                },
            }),
        }
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;

        Ok(json + "\n")
    }
}

// Field order below is the order the keys appear on the wire.

#[derive(Serialize)]
struct LedJson {
    #[serde(rename = "HWCIDs")]
    hwc_ids: [u16; 1],
    #[serde(rename = "HWCMode")]
    mode: ModeJson,
    #[serde(rename = "HWCColor")]
    color: ColorJson,
    #[serde(rename = "HWCExtended")]
    extended: ExtendedJson,
    #[serde(rename = "HWCText")]
    text: TextJson,
}

#[derive(Serialize)]
struct LabelJson {
    #[serde(rename = "HWCIDs")]
    hwc_ids: [u16; 1],
    #[serde(rename = "HWCText")]
    text: TextJson,
}

#[derive(Serialize)]
struct ModeJson {
    #[serde(rename = "State")]
    state: u8,
}

#[derive(Serialize)]
struct ColorJson {
    #[serde(rename = "ColorIndex")]
    color_index: ColorIndexJson,
}

#[derive(Serialize)]
struct ColorIndexJson {
    #[serde(rename = "Index")]
    index: u8,
}

#[derive(Serialize)]
struct ExtendedJson {}

#[derive(Serialize)]
struct TextJson {
    #[serde(rename = "Formatting")]
    formatting: u8,
    #[serde(rename = "Textline1", skip_serializing_if = "Option::is_none")]
    textline1: Option<String>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
