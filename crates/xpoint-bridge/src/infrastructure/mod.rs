//! Infrastructure layer for xpoint-bridge.
//!
//! The infrastructure layer handles all I/O: the TCP sessions to the panel
//! and the hub, the optional config file, and process wiring.
//!
//! # Responsibilities
//!
//! - Opening, initialising and re-opening each device session with backoff
//! - Reading newline-terminated lines and decoding them into events
//! - Queueing outbound commands so a slow device never stalls the other link
//! - Loading `xpoint-bridge.toml`
//! - Pumping link events into the [`crate::application::Bridge`]
//!
//! # What does NOT belong here?
//!
//! - Deciding which LED to light (that is the application layer)
//! - Line syntax (that is `xpoint-core`)

pub mod backoff;
pub mod config_file;
pub mod hub_conn;
pub mod line_session;
pub mod panel_conn;
pub mod runner;

use std::net::SocketAddr;

use thiserror::Error;

pub use hub_conn::HubLink;
pub use panel_conn::PanelLink;
pub use runner::run_bridge;

/// Session-level failures of a device link.
///
/// All of these end the current session.  The link supervisor then waits
/// out its backoff and reconnects.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The TCP connection could not be established.
    #[error("failed to connect to {link} at {addr}: {source}")]
    ConnectFailed {
        link: &'static str,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred on the established connection.
    #[error("{link} connection I/O error: {source}")]
    Io {
        link: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The device closed the connection.
    #[error("{link} closed the connection")]
    Closed { link: &'static str },

    /// Nobody is listening for this link's events any more.
    #[error("{link} event consumer has gone away")]
    ConsumerGone { link: &'static str },
}

/// Events a device link reports to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent<E> {
    /// A session was established and its init lines were sent.
    Connected,
    /// The session ended; the link is about to back off and reconnect.
    Disconnected,
    /// A decoded inbound message.
    Message(E),
}
