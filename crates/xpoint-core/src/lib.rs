//! # xpoint-core
//!
//! Shared library for the xpoint bridge containing the two line protocols
//! (control panel and Videohub router) and the routing state the bridge keeps
//! in sync between them.
//!
//! This crate has zero dependencies on sockets or async runtimes.  Everything
//! in it can be exercised with plain strings in unit tests.
//!
//! # Architecture overview (for beginners)
//!
//! The bridge sits between two devices that never talk to each other:
//!
//! - A **panel**: a hardware control surface with illuminated, labelled
//!   buttons.  It reports button presses as text lines (`HWC#3=Down`) and
//!   accepts one JSON object per line to change a button's LED or label.
//! - A **hub**: a video router.  It dumps status blocks (input labels,
//!   output routing) as text and accepts routing commands in the same syntax.
//!
//! This crate defines:
//!
//! - **`domain`** – Input indices, the button↔input mapping, the label store
//!   and the routing state for the one monitored output.
//!
//! - **`protocol`** – Parsers and encoders for both devices.  The hub side is
//!   an explicit state machine ([`HubParser`]) because the hub speaks in
//!   multi-line blocks rather than self-contained lines.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `xpoint_core::RoutingState` instead of `xpoint_core::domain::routing::RoutingState`.
pub use domain::input::{ButtonMap, HwcId, InputIndex, INPUT_COUNT};
pub use domain::labels::LabelStore;
pub use domain::routing::{RoutingChange, RoutingState};
pub use protocol::error::ProtocolError;
pub use protocol::hub::{HubEvent, HubParser, HubParserState};
pub use protocol::panel::{PanelCommand, PanelEvent};
