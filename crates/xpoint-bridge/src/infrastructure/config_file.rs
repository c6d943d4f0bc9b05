//! Optional TOML overrides for [`BridgeConfig`].
//!
//! The bridge runs without any configuration: the defaults in
//! [`BridgeConfig::default`] describe the installation it was built for.  If
//! a file named `xpoint-bridge.toml` exists in the working directory, any
//! field it sets replaces the default.  Example:
//!
//! ```toml
//! [panel]
//! addr = "192.168.11.5:9973"
//! hwc_offset = 1
//!
//! [hub]
//! addr = "192.168.10.61:9990"
//! monitored_output = 2
//!
//! [reconnect]
//! initial_delay_ms = 500
//! max_delay_ms = 30000
//! multiplier = 2
//! ```
//!
//! Every field is optional (`#[serde(default)]`), so a file that only moves
//! the hub to another address is three lines long.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::BridgeConfig;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "xpoint-bridge.toml";

/// Error type for loading the overrides file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An address field is not a valid `ip:port`.
    #[error("invalid {field} address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

// ── File schema ───────────────────────────────────────────────────────────────

/// Top-level layout of `xpoint-bridge.toml`.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub panel: PanelSection,
    pub hub: HubSection,
    pub reconnect: ReconnectSection,
    pub command_queue: Option<usize>,
}

/// `[panel]` section.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PanelSection {
    pub addr: Option<String>,
    pub hwc_offset: Option<u8>,
}

/// `[hub]` section.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HubSection {
    pub addr: Option<String>,
    pub monitored_output: Option<u16>,
}

/// `[reconnect]` section.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectSection {
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub multiplier: Option<u32>,
}

impl ConfigFile {
    /// Parses the TOML text of an overrides file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies every set field on top of `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if an address does not parse.
    pub fn apply(self, mut base: BridgeConfig) -> Result<BridgeConfig, ConfigError> {
        if let Some(addr) = self.panel.addr {
            base.panel_addr = parse_addr("panel", addr)?;
        }
        if let Some(offset) = self.panel.hwc_offset {
            base.hwc_offset = offset;
        }
        if let Some(addr) = self.hub.addr {
            base.hub_addr = parse_addr("hub", addr)?;
        }
        if let Some(output) = self.hub.monitored_output {
            base.monitored_output = output;
        }
        if let Some(ms) = self.reconnect.initial_delay_ms {
            base.reconnect.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.reconnect.max_delay_ms {
            base.reconnect.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = self.reconnect.multiplier {
            base.reconnect.multiplier = multiplier;
        }
        if let Some(capacity) = self.command_queue {
            base.command_queue = capacity;
        }
        Ok(base)
    }
}

fn parse_addr(field: &'static str, value: String) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidAddress { field, value })
}

/// Loads the configuration: defaults, overridden by `path` if it exists.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file exists but cannot be read, parsed
/// or applied.  A missing file is not an error.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(BridgeConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ConfigFile::parse(&text)?.apply(BridgeConfig::default())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
