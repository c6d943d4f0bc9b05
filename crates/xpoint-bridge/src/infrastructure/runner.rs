//! Process wiring: both links, both event pumps, and shutdown.
//!
//! ```text
//! PanelLink ──events──▶ panel pump ──▶ Bridge ──▶ HubLink   (crosspoint)
//! HubLink   ──events──▶ hub pump   ──▶ Bridge ──▶ PanelLink (LEDs, labels)
//! ```
//!
//! Each pump handles its own link's events strictly in order.  The two pumps
//! run concurrently with each other and share the [`Bridge`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use xpoint_core::{LabelStore, RoutingState};

use crate::application::{Bridge, HubSink, PanelSink};
use crate::domain::BridgeConfig;
use crate::infrastructure::hub_conn::{HubLink, HubLinkEvent};
use crate::infrastructure::panel_conn::{PanelLink, PanelLinkEvent};
use crate::infrastructure::LinkEvent;

/// How often the shutdown flag is polled.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Runs the bridge until `running` is set to `false`.
///
/// Connection failures are never fatal: each link keeps reconnecting with
/// backoff for as long as the bridge runs.
///
/// # Errors
///
/// Currently always returns `Ok`; the `Result` leaves room for startup
/// failures without changing callers.
pub async fn run_bridge(config: BridgeConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    info!(
        "bridging panel {} ↔ hub {} (output {})",
        config.panel_addr, config.hub_addr, config.monitored_output
    );

    let labels = Arc::new(LabelStore::new());
    let panel = Arc::new(PanelLink::new(&config));
    let hub = Arc::new(HubLink::new(&config, Arc::clone(&labels)));
    let panel_sink: Arc<dyn PanelSink> = panel.clone();
    let hub_sink: Arc<dyn HubSink> = hub.clone();
    let bridge = Arc::new(Bridge::new(
        panel_sink,
        hub_sink,
        Arc::new(RoutingState::new()),
        labels,
        config.monitored_output,
    ));

    let panel_events = panel.start(Arc::clone(&running));
    let hub_events = hub.start(Arc::clone(&running));

    let panel_pump = tokio::spawn(pump_panel_events(Arc::clone(&bridge), panel_events));
    let hub_pump = tokio::spawn(pump_hub_events(Arc::clone(&bridge), hub_events));

    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }

    info!("shutting down bridge");
    panel_pump.abort();
    hub_pump.abort();
    Ok(())
}

/// Feeds panel link events into the bridge until the link stops.
pub async fn pump_panel_events(bridge: Arc<Bridge>, mut events: mpsc::Receiver<PanelLinkEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            LinkEvent::Connected => bridge.resync_panel().await,
            LinkEvent::Disconnected => debug!("panel session lost"),
            LinkEvent::Message(input) => bridge.on_button_press(input).await,
        }
    }
}

/// Feeds hub link events into the bridge until the link stops.
pub async fn pump_hub_events(bridge: Arc<Bridge>, mut events: mpsc::Receiver<HubLinkEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            LinkEvent::Connected => debug!("hub session up; awaiting status dump"),
            LinkEvent::Disconnected => debug!("hub session lost"),
            LinkEvent::Message(event) => bridge.on_hub_event(event).await,
        }
    }
}
