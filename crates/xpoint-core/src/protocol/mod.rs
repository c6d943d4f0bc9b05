//! Line protocols spoken by the panel and the hub.

pub mod error;
pub mod hub;
pub mod panel;

pub use error::ProtocolError;
pub use hub::{encode_crosspoint, HubEvent, HubParser, HubParserState, HUB_INIT};
pub use panel::{parse_panel_line, PanelCommand, PanelEvent, PANEL_INIT};
