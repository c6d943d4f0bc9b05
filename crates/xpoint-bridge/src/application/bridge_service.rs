//! The coordinator between panel events and hub events.
//!
//! The bridge is a state-reconciliation layer, not a command relay:
//!
//! ```text
//! panel: button pressed  ──▶ hub: set crosspoint          (no local change)
//! hub:   routing changed ──▶ RoutingState ──▶ panel: LED off(old), LED on(new)
//! hub:   input label     ──────────────────▶ panel: label
//! ```
//!
//! LEDs only ever change in response to the hub.  The panel therefore shows
//! what the hub is actually doing, including changes made from other control
//! surfaces on the same network.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use xpoint_core::{HubEvent, InputIndex, LabelStore, ProtocolError, RoutingChange, RoutingState};

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors returned when a command cannot be handed to a device link.
///
/// None of these abort anything: the bridge logs them and carries on.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The link has no live session to write to.
    #[error("{link} link is not connected")]
    NotConnected { link: &'static str },

    /// The link's outbound queue is full; the command was dropped.
    #[error("{link} command queue is full")]
    QueueFull { link: &'static str },

    /// The command could not be encoded for the wire.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

// ── Device seams ──────────────────────────────────────────────────────────────

/// Outbound commands the bridge issues to the panel.
///
/// Implementations address buttons by input; mapping an input to a panel
/// HWC id is their concern.  Calls made in sequence must be delivered in
/// that sequence.
#[async_trait]
pub trait PanelSink: Send + Sync {
    /// Lights (`on = true`) or darkens the button for `input`.
    async fn set_led(&self, input: InputIndex, on: bool) -> Result<(), BridgeError>;

    /// Shows `label` on the button for `input`.
    async fn set_label(&self, input: InputIndex, label: &str) -> Result<(), BridgeError>;
}

/// Outbound commands the bridge issues to the hub.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HubSink: Send + Sync {
    /// Asks the hub to route `input` to `output`.
    async fn set_crosspoint(&self, output: u16, input: InputIndex) -> Result<(), BridgeError>;
}

// ── Coordinator ───────────────────────────────────────────────────────────────

/// Reacts to events from both links.
///
/// The bridge is the only writer of [`RoutingState`].  It reads the
/// [`LabelStore`] that the hub link fills in.  It is shared (`Arc<Bridge>`)
/// between the panel and hub event pumps, which may call into it
/// concurrently.
///
/// Every sequence that reads the routing state and then issues LED commands
/// runs under `led_order`, so the panel sees those sequences one at a time
/// and never ends up with two lit buttons.
pub struct Bridge {
    panel: Arc<dyn PanelSink>,
    hub: Arc<dyn HubSink>,
    routing: Arc<RoutingState>,
    labels: Arc<LabelStore>,
    monitored_output: u16,
    led_order: Mutex<()>,
}

impl Bridge {
    /// Creates a bridge that follows `monitored_output` on the hub.
    pub fn new(
        panel: Arc<dyn PanelSink>,
        hub: Arc<dyn HubSink>,
        routing: Arc<RoutingState>,
        labels: Arc<LabelStore>,
        monitored_output: u16,
    ) -> Self {
        Self {
            panel,
            hub,
            routing,
            labels,
            monitored_output,
            led_order: Mutex::new(()),
        }
    }

    /// Returns the shared routing state.
    pub fn routing(&self) -> &Arc<RoutingState> {
        &self.routing
    }

    /// Returns the shared label store.
    pub fn labels(&self) -> &Arc<LabelStore> {
        &self.labels
    }

    /// A panel button for `input` went down.
    ///
    /// Only asks the hub for the route.  The LEDs change once the hub echoes
    /// the new routing back.
    pub async fn on_button_press(&self, input: InputIndex) {
        debug!("button for input {input} pressed; requesting crosspoint");
        if let Err(e) = self.hub.set_crosspoint(self.monitored_output, input).await {
            error!(
                "failed to route input {input} to output {}: {e}",
                self.monitored_output
            );
        }
    }

    /// The hub reported that `input` now feeds the monitored output.
    ///
    /// The routing state is swapped under its own lock, then the LED
    /// commands are issued off before on.  Both steps happen under
    /// `led_order`.
    pub async fn on_routing_change(&self, input: InputIndex) -> RoutingChange {
        let _leds = self.led_order.lock().await;
        let change = self.routing.apply(input);
        if change.is_unchanged() {
            debug!(
                "output {} re-reported on input {}",
                self.monitored_output, change.current
            );
        } else {
            info!(
                "current input for output {}: {} (was {})",
                self.monitored_output, change.current, change.previous
            );
        }

        if let Err(e) = self.panel.set_led(change.previous, false).await {
            error!("failed to darken button for input {}: {e}", change.previous);
        }
        if let Err(e) = self.panel.set_led(change.current, true).await {
            error!("failed to light button for input {}: {e}", change.current);
        }
        change
    }

    /// The hub (re)announced the name of `input`.
    ///
    /// The hub link has already stored it.  Every announcement is forwarded,
    /// even when the name did not change.
    pub async fn on_label(&self, input: InputIndex, label: String) {
        if let Err(e) = self.panel.set_label(input, &label).await {
            error!("failed to label button for input {input}: {e}");
        }
    }

    /// Dispatches one parsed hub event.
    pub async fn on_hub_event(&self, event: HubEvent) {
        match event {
            HubEvent::Label { input, label } => self.on_label(input, label).await,
            HubEvent::RoutingChanged(input) => {
                self.on_routing_change(input).await;
            }
        }
    }

    /// Re-sends everything the panel should be showing.
    ///
    /// Called after the panel session is (re)established, because the
    /// session's `Clear` wipes every button.
    pub async fn resync_panel(&self) {
        let _leds = self.led_order.lock().await;
        let labelled = self.labels.labelled();
        debug!("resyncing panel: {} labels", labelled.len());
        for (input, label) in labelled {
            if let Err(e) = self.panel.set_label(input, &label).await {
                error!("failed to label button for input {input}: {e}");
            }
        }

        let current = self.routing.current();
        if let Err(e) = self.panel.set_led(current, true).await {
            error!("failed to light button for input {current}: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::predicate::eq;

    use super::*;

    /// A panel call as seen by [`RecordingPanel`].
    #[derive(Debug, Clone, PartialEq)]
    enum PanelCall {
        Led(u8, bool),
        Label(u8, String),
    }

    /// Records every panel call in order.
    #[derive(Default)]
    struct RecordingPanel {
        calls: Mutex<Vec<PanelCall>>,
        fail: bool,
    }

    impl RecordingPanel {
        fn calls(&self) -> Vec<PanelCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PanelSink for RecordingPanel {
        async fn set_led(&self, input: InputIndex, on: bool) -> Result<(), BridgeError> {
            self.calls.lock().unwrap().push(PanelCall::Led(input.get(), on));
            if self.fail {
                return Err(BridgeError::NotConnected { link: "panel" });
            }
            Ok(())
        }

        async fn set_label(&self, input: InputIndex, label: &str) -> Result<(), BridgeError> {
            self.calls
                .lock()
                .unwrap()
                .push(PanelCall::Label(input.get(), label.to_string()));
            Ok(())
        }
    }

    fn idx(n: u8) -> InputIndex {
        InputIndex::new(n).unwrap()
    }

    fn bridge_with(panel: Arc<RecordingPanel>, hub: MockHubSink) -> Bridge {
        Bridge::new(
            panel,
            Arc::new(hub),
            Arc::new(RoutingState::new()),
            Arc::new(LabelStore::new()),
            2,
        )
    }

    /// A hub mock that must never be called.
    fn silent_hub() -> MockHubSink {
        let mut hub = MockHubSink::new();
        hub.expect_set_crosspoint().never();
        hub
    }

    #[tokio::test]
    async fn test_button_press_requests_crosspoint_on_monitored_output() {
        // Arrange
        let mut hub = MockHubSink::new();
        hub.expect_set_crosspoint()
            .with(eq(2u16), eq(idx(1)))
            .times(1)
            .returning(|_, _| Ok(()));
        let panel = Arc::new(RecordingPanel::default());
        let bridge = bridge_with(Arc::clone(&panel), hub);

        // Act
        bridge.on_button_press(idx(1)).await;

        // Assert: no local state or LED change until the hub echoes back
        assert!(panel.calls().is_empty());
        assert_eq!(bridge.routing().current(), idx(0));
    }

    #[tokio::test]
    async fn test_hub_failure_on_button_press_is_not_fatal() {
        let mut hub = MockHubSink::new();
        hub.expect_set_crosspoint()
            .times(1)
            .returning(|_, _| Err(BridgeError::QueueFull { link: "hub" }));
        let bridge = bridge_with(Arc::new(RecordingPanel::default()), hub);

        bridge.on_button_press(idx(3)).await;
    }

    #[tokio::test]
    async fn test_routing_change_turns_old_off_then_new_on() {
        // Arrange
        let panel = Arc::new(RecordingPanel::default());
        let bridge = bridge_with(Arc::clone(&panel), silent_hub());
        bridge.on_routing_change(idx(3)).await;
        panel.calls.lock().unwrap().clear();

        // Act
        let change = bridge.on_routing_change(idx(8)).await;

        // Assert
        assert_eq!(change.previous, idx(3));
        assert_eq!(
            panel.calls(),
            vec![PanelCall::Led(3, false), PanelCall::Led(8, true)]
        );
        assert_eq!(bridge.routing().current(), idx(8));
    }

    #[tokio::test]
    async fn test_first_routing_change_darkens_input_zero() {
        // Arrange
        let panel = Arc::new(RecordingPanel::default());
        let bridge = bridge_with(Arc::clone(&panel), silent_hub());

        // Act
        bridge.on_hub_event(HubEvent::RoutingChanged(idx(5))).await;

        // Assert
        assert_eq!(
            panel.calls(),
            vec![PanelCall::Led(0, false), PanelCall::Led(5, true)]
        );
        assert_eq!(bridge.routing().current(), idx(5));
    }

    #[tokio::test]
    async fn test_led_failure_still_updates_state_and_tries_both() {
        // Arrange
        let panel = Arc::new(RecordingPanel {
            fail: true,
            ..Default::default()
        });
        let bridge = bridge_with(Arc::clone(&panel), silent_hub());

        // Act
        bridge.on_routing_change(idx(4)).await;

        // Assert
        assert_eq!(panel.calls().len(), 2);
        assert_eq!(bridge.routing().current(), idx(4));
    }

    #[tokio::test]
    async fn test_label_is_forwarded_without_touching_store() {
        // Arrange
        let panel = Arc::new(RecordingPanel::default());
        let bridge = bridge_with(Arc::clone(&panel), silent_hub());

        // Act
        bridge
            .on_hub_event(HubEvent::Label {
                input: idx(6),
                label: "Camera 7".into(),
            })
            .await;

        // Assert
        assert_eq!(panel.calls(), vec![PanelCall::Label(6, "Camera 7".into())]);
        assert!(bridge.labels().labelled().is_empty());
    }

    #[tokio::test]
    async fn test_identical_label_broadcast_is_forwarded_again() {
        // Arrange
        let panel = Arc::new(RecordingPanel::default());
        let bridge = bridge_with(Arc::clone(&panel), silent_hub());

        // Act: the same 16-label block twice
        for _ in 0..2 {
            for input in InputIndex::all() {
                bridge.on_label(input, format!("In {input}")).await;
            }
        }

        // Assert
        assert_eq!(panel.calls().len(), 32);
        assert_eq!(panel.calls()[31], PanelCall::Label(15, "In 15".into()));
    }

    #[tokio::test]
    async fn test_resync_sends_known_labels_then_current_led() {
        // Arrange
        let panel = Arc::new(RecordingPanel::default());
        let bridge = bridge_with(Arc::clone(&panel), silent_hub());
        bridge.labels().set(idx(2), "Two");
        bridge.labels().set(idx(0), "Zero");
        bridge.routing().apply(idx(2));

        // Act
        bridge.resync_panel().await;

        // Assert
        assert_eq!(
            panel.calls(),
            vec![
                PanelCall::Label(0, "Zero".into()),
                PanelCall::Label(2, "Two".into()),
                PanelCall::Led(2, true),
            ]
        );
    }

    /// Records LED calls and yields to the scheduler before lighting a
    /// button, so concurrent bridge calls get a chance to interleave.
    #[derive(Default)]
    struct YieldingPanel {
        leds: Mutex<Vec<(u8, bool)>>,
    }

    impl YieldingPanel {
        /// Replays the recorded calls and returns the inputs left lit.
        fn lit(&self) -> Vec<u8> {
            let mut lit = [false; 16];
            for &(input, on) in self.leds.lock().unwrap().iter() {
                lit[input as usize] = on;
            }
            (0..16u8).filter(|&i| lit[i as usize]).collect()
        }
    }

    #[async_trait]
    impl PanelSink for YieldingPanel {
        async fn set_led(&self, input: InputIndex, on: bool) -> Result<(), BridgeError> {
            if on {
                for _ in 0..3 {
                    tokio::task::yield_now().await;
                }
            }
            self.leds.lock().unwrap().push((input.get(), on));
            Ok(())
        }

        async fn set_label(&self, _input: InputIndex, _label: &str) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_resync_racing_routing_change_leaves_one_button_lit() {
        // Arrange
        let panel = Arc::new(YieldingPanel::default());
        let bridge = Bridge::new(
            Arc::clone(&panel) as Arc<dyn PanelSink>,
            Arc::new(silent_hub()),
            Arc::new(RoutingState::new()),
            Arc::new(LabelStore::new()),
            2,
        );

        // Act: panel reconnect and hub report arrive together
        tokio::join!(bridge.resync_panel(), bridge.on_routing_change(idx(5)));

        // Assert
        assert_eq!(panel.lit(), vec![5]);
        assert_eq!(bridge.routing().current(), idx(5));
    }
}
