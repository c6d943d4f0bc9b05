//! TCP session to the video hub.
//!
//! [`HubLink`] feeds every received line through a [`HubParser`] and reports
//! the resulting label and routing events.  Labels are written to the shared
//! [`LabelStore`] as each line of the label block is decoded; nothing else
//! writes to the store.  Outbound the link only ever sends crosspoint
//! commands.
//!
//! On every (re)connect the parser is reset and `list` is sent; the hub
//! answers with a full status dump, which replaces whatever the bridge knew
//! before.

use std::sync::{atomic::AtomicBool, Arc};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use xpoint_core::protocol::{encode_crosspoint, HUB_INIT};
use xpoint_core::{HubEvent, HubParser, InputIndex, LabelStore};

use crate::application::{BridgeError, HubSink};
use crate::domain::BridgeConfig;
use crate::infrastructure::line_session::{LineDecoder, LineSession};
use crate::infrastructure::LinkEvent;

/// Events reported by the hub link.
pub type HubLinkEvent = LinkEvent<HubEvent>;

const LINK_NAME: &str = "hub";

/// Runs hub lines through a [`HubParser`] and records decoded labels.
pub struct HubDecoder {
    parser: HubParser,
    labels: Arc<LabelStore>,
}

impl HubDecoder {
    /// Creates a decoder for `monitored_output` that stores labels in `labels`.
    pub fn new(monitored_output: u16, labels: Arc<LabelStore>) -> Self {
        Self {
            parser: HubParser::new(monitored_output),
            labels,
        }
    }
}

impl LineDecoder for HubDecoder {
    type Event = HubEvent;

    fn reset(&mut self) {
        self.parser.reset();
    }

    fn decode(&mut self, line: &str) -> Option<HubEvent> {
        match self.parser.feed(line) {
            Ok(Some(HubEvent::Label { input, label })) => {
                self.labels.set(input, label.as_str());
                Some(HubEvent::Label { input, label })
            }
            Ok(event) => event,
            Err(e) => {
                warn!("dropping hub line {line:?}: {e}");
                None
            }
        }
    }
}

/// The bridge's connection to the hub.
pub struct HubLink {
    session: Arc<LineSession>,
    monitored_output: u16,
    labels: Arc<LabelStore>,
}

impl HubLink {
    /// Creates the link and its writer task.  Call [`HubLink::start`] to
    /// begin connecting.  Labels received from the hub are stored in `labels`.
    pub fn new(config: &BridgeConfig, labels: Arc<LabelStore>) -> Self {
        Self {
            session: LineSession::start(
                LINK_NAME,
                config.hub_addr,
                &[HUB_INIT],
                config.reconnect,
                config.command_queue,
            ),
            monitored_output: config.monitored_output,
            labels,
        }
    }

    /// Spawns the session supervisor and returns the event stream.
    pub fn start(&self, running: Arc<AtomicBool>) -> mpsc::Receiver<HubLinkEvent> {
        let (tx, rx) = mpsc::channel(128);
        let decoder = HubDecoder::new(self.monitored_output, Arc::clone(&self.labels));
        tokio::spawn(Arc::clone(&self.session).supervise(decoder, tx, running));
        rx
    }
}

#[async_trait]
impl HubSink for HubLink {
    async fn set_crosspoint(&self, output: u16, input: InputIndex) -> Result<(), BridgeError> {
        self.session.enqueue(encode_crosspoint(output, input))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
