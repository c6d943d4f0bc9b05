//! xpoint bridge entry point.
//!
//! Connects to a button panel and a video hub and keeps them in step:
//!
//! - pressing an input button on the panel routes that input to the
//!   monitored hub output;
//! - whenever the hub reports a new route for that output (from this panel
//!   or anywhere else), the old button goes dark and the new one lights;
//! - input names from the hub are shown on the buttons.
//!
//! # Configuration
//!
//! Addresses and the monitored output are built in (see
//! [`xpoint_bridge::domain::BridgeConfig`]).  An `xpoint-bridge.toml` in the
//! working directory overrides them.  Log verbosity follows `RUST_LOG`
//! (default `info`).

use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xpoint_bridge::infrastructure::config_file::{load_config, CONFIG_FILE_NAME};
use xpoint_bridge::infrastructure::run_bridge;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config(Path::new(CONFIG_FILE_NAME))
        .with_context(|| format!("failed to load {CONFIG_FILE_NAME}"))?;

    info!("xpoint bridge starting");

    // Shutdown flag shared by both link supervisors and the runner.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; stopping");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_bridge(config, running).await?;

    info!("xpoint bridge stopped");
    Ok(())
}
