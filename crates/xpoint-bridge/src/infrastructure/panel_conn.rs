//! TCP session to the control panel.
//!
//! [`PanelLink`] turns `HWC#<n>=Down` lines into button presses carrying the
//! zero-based hub input, and turns LED and label requests into the panel's
//! one-JSON-object-per-line commands.  Both directions go through the same
//! [`ButtonMap`], so the button that was pressed is the button that lights.
//!
//! On every (re)connect the link sends `list` and `Clear` before anything
//! else.

use std::sync::{atomic::AtomicBool, Arc};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use xpoint_core::protocol::{parse_panel_line, PANEL_INIT};
use xpoint_core::{ButtonMap, InputIndex, PanelCommand, PanelEvent};

use crate::application::{BridgeError, PanelSink};
use crate::domain::BridgeConfig;
use crate::infrastructure::line_session::{LineDecoder, LineSession};
use crate::infrastructure::LinkEvent;

/// Events reported by the panel link.  `Message` carries the pressed input.
pub type PanelLinkEvent = LinkEvent<InputIndex>;

const LINK_NAME: &str = "panel";

/// Decodes panel lines into the inputs their buttons address.
#[derive(Debug, Clone)]
pub struct PanelDecoder {
    buttons: ButtonMap,
}

impl PanelDecoder {
    /// Creates a decoder using `buttons` to map HWC ids to inputs.
    pub fn new(buttons: ButtonMap) -> Self {
        Self { buttons }
    }
}

impl LineDecoder for PanelDecoder {
    type Event = InputIndex;

    fn reset(&mut self) {}

    fn decode(&mut self, line: &str) -> Option<InputIndex> {
        match parse_panel_line(line) {
            Ok(Some(PanelEvent::ButtonDown(hwc))) => {
                let input = self.buttons.input_for(hwc);
                if input.is_none() {
                    debug!("button {hwc} does not address an input; ignoring");
                }
                input
            }
            Ok(None) => None,
            Err(e) => {
                warn!("dropping panel line {line:?}: {e}");
                None
            }
        }
    }
}

/// The bridge's connection to the panel.
pub struct PanelLink {
    session: Arc<LineSession>,
    buttons: ButtonMap,
}

impl PanelLink {
    /// Creates the link and its writer task.  Call [`PanelLink::start`] to
    /// begin connecting.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            session: LineSession::start(
                LINK_NAME,
                config.panel_addr,
                &PANEL_INIT,
                config.reconnect,
                config.command_queue,
            ),
            buttons: config.button_map(),
        }
    }

    /// Spawns the session supervisor and returns the event stream.
    pub fn start(&self, running: Arc<AtomicBool>) -> mpsc::Receiver<PanelLinkEvent> {
        let (tx, rx) = mpsc::channel(128);
        let decoder = PanelDecoder::new(self.buttons);
        tokio::spawn(Arc::clone(&self.session).supervise(decoder, tx, running));
        rx
    }

    fn send(&self, command: PanelCommand) -> Result<(), BridgeError> {
        let line = command.encode()?;
        self.session.enqueue(line)
    }
}

#[async_trait]
impl PanelSink for PanelLink {
    async fn set_led(&self, input: InputIndex, on: bool) -> Result<(), BridgeError> {
        self.send(PanelCommand::SetLed {
            hwc: self.buttons.hwc_for(input),
            on,
        })
    }

    async fn set_label(&self, input: InputIndex, label: &str) -> Result<(), BridgeError> {
        self.send(PanelCommand::SetLabel {
            hwc: self.buttons.hwc_for(input),
            label: label.to_string(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
