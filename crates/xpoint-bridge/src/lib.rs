//! xpoint-bridge library crate.
//!
//! This crate keeps a hardware button panel in step with one output of a
//! video router ("hub").  Pressing a panel button asks the hub to route that
//! input; whenever the hub reports a routing change, the old button goes dark
//! and the new one lights up.  Input names reported by the hub are shown on
//! the buttons.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Panel (button lines / JSON commands over TCP)
//!         ↕
//! [xpoint-bridge]
//!   ├── domain/           BridgeConfig, ReconnectPolicy
//!   ├── application/      Bridge: button → crosspoint, routing → LEDs
//!   └── infrastructure/
//!         ├── panel_conn/ PanelLink: TCP session to the panel
//!         ├── hub_conn/   HubLink: TCP session to the hub
//!         ├── line_session/ Reconnecting line-oriented TCP session
//!         ├── backoff/    Reconnect schedule
//!         ├── config_file/ Optional TOML overrides
//!         └── runner/     Wires links, event pumps and shutdown
//!         ↕
//! Hub (Videohub text blocks over TCP)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `xpoint-core` only; it talks to the
//!   devices through the [`application::PanelSink`] and
//!   [`application::HubSink`] traits.
//! - `infrastructure` implements those traits on top of `tokio`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: the coordinator between panel and hub events.
pub mod application;

/// Infrastructure layer: device sessions, config file and the runner.
pub mod infrastructure;
