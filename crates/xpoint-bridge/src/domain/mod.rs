//! Domain layer for xpoint-bridge.
//!
//! Plain configuration types.  Nothing here opens a socket or reads a file;
//! the infrastructure layer is responsible for populating these structs.

pub mod config;

pub use config::{BridgeConfig, ReconnectPolicy};
