//! Application layer for xpoint-bridge.
//!
//! The application layer decides *what* happens when a device reports
//! something; the infrastructure layer decides *how* commands reach the
//! devices.
//!
//! # Responsibilities
//!
//! - Turning a panel button press into a hub crosspoint command
//! - Turning a hub routing change into LED off/on commands for the panel
//! - Forwarding hub input labels to the panel
//! - Re-painting the panel after it reconnects
//!
//! # What does NOT belong here?
//!
//! - Sockets, reconnect loops and command queues (that is infrastructure)
//! - Line parsing (that is `xpoint-core`)

pub mod bridge_service;

pub use bridge_service::{Bridge, BridgeError, HubSink, PanelSink};
