//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! Its [`Default`] carries the addresses and output id of the installation
//! the bridge was built for.  An optional TOML file can override them (see
//! `infrastructure::config_file`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use xpoint_core::domain::input::DEFAULT_HWC_OFFSET;
use xpoint_core::ButtonMap;

/// Panel address used when no override is configured.
pub const DEFAULT_PANEL_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 11, 5)), 9973);
/// Hub address used when no override is configured.
pub const DEFAULT_HUB_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 10, 61)), 9990);
/// Zero-based hub output whose routing the panel shows.
pub const DEFAULT_MONITORED_OUTPUT: u16 = 2;

/// All runtime configuration for the bridge.
///
/// Build this once at startup and wrap it in an `Arc` to share it between
/// the link tasks.
///
/// # Example
///
/// ```rust
/// use xpoint_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.hub_addr.port(), 9990);
/// assert_eq!(cfg.monitored_output, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// TCP address of the panel's raw-panel server.
    pub panel_addr: SocketAddr,

    /// TCP address of the hub's Ethernet control port.
    pub hub_addr: SocketAddr,

    /// Hub output whose routing the panel follows.
    pub monitored_output: u16,

    /// Distance between a panel HWC id and the hub input it addresses
    /// (`input = hwc - hwc_offset`).
    pub hwc_offset: u8,

    /// How long to wait between reconnect attempts.
    pub reconnect: ReconnectPolicy,

    /// Capacity of each link's outbound command queue.
    pub command_queue: usize,
}

impl BridgeConfig {
    /// Returns the button mapping described by `hwc_offset`.
    pub fn button_map(&self) -> ButtonMap {
        ButtonMap::new(self.hwc_offset)
    }
}

impl Default for BridgeConfig {
    /// | Field            | Default               |
    /// |------------------|-----------------------|
    /// | panel_addr       | `192.168.11.5:9973`   |
    /// | hub_addr         | `192.168.10.61:9990`  |
    /// | monitored_output | `2`                   |
    /// | hwc_offset       | `1`                   |
    /// | command_queue    | `128`                 |
    fn default() -> Self {
        Self {
            panel_addr: DEFAULT_PANEL_ADDR,
            hub_addr: DEFAULT_HUB_ADDR,
            monitored_output: DEFAULT_MONITORED_OUTPUT,
            hwc_offset: DEFAULT_HWC_OFFSET,
            reconnect: ReconnectPolicy::default(),
            command_queue: 128,
        }
    }
}

/// Exponential backoff parameters for re-establishing a device session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Factor applied to the delay after every failed attempt.
    pub multiplier: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
