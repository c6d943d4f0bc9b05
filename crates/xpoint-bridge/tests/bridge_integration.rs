//! Integration tests for the full bridge over real TCP sockets.
//!
//! Each test plays both devices: a local listener stands in for the panel,
//! another for the hub, and `run_bridge` connects to both exactly as it
//! would in production.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use xpoint_bridge::domain::{BridgeConfig, ReconnectPolicy};
use xpoint_bridge::infrastructure::run_bridge;
use xpoint_core::{HwcId, PanelCommand};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// One accepted device connection, seen from the device's side.
struct FakeDevice {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl FakeDevice {
    async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = timeout(STEP_TIMEOUT, listener.accept())
            .await
            .expect("bridge must connect in time")
            .expect("accept must succeed");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn next_line(&mut self) -> String {
        timeout(STEP_TIMEOUT, self.lines.next_line())
            .await
            .expect("line must arrive in time")
            .expect("read must succeed")
            .expect("connection must stay open")
    }

    async fn send(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.expect("write must succeed");
    }
}

struct Harness {
    panel_listener: TcpListener,
    hub_listener: TcpListener,
    running: Arc<AtomicBool>,
    bridge: JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    async fn start(hwc_offset: u8) -> Self {
        let panel_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let hub_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = BridgeConfig {
            panel_addr: local_addr(&panel_listener),
            hub_addr: local_addr(&hub_listener),
            monitored_output: 2,
            hwc_offset,
            reconnect: ReconnectPolicy {
                initial_delay: Duration::from_millis(20),
                max_delay: Duration::from_millis(100),
                multiplier: 2,
            },
            command_queue: 64,
        };
        let running = Arc::new(AtomicBool::new(true));
        let bridge = tokio::spawn(run_bridge(config, Arc::clone(&running)));
        Self {
            panel_listener,
            hub_listener,
            running,
            bridge,
        }
    }

    /// Accepts the panel session and consumes its init lines and the
    /// initial resync (input 0 lit).
    async fn accept_panel(&self) -> FakeDevice {
        let mut panel = FakeDevice::accept(&self.panel_listener).await;
        assert_eq!(panel.next_line().await, "list");
        assert_eq!(panel.next_line().await, "Clear");
        panel
    }

    async fn accept_hub(&self) -> FakeDevice {
        let mut hub = FakeDevice::accept(&self.hub_listener).await;
        assert_eq!(hub.next_line().await, "list");
        hub
    }

    async fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        let result = timeout(STEP_TIMEOUT, self.bridge)
            .await
            .expect("bridge must stop in time")
            .expect("bridge task must not panic");
        assert!(result.is_ok());
    }
}

fn local_addr(listener: &TcpListener) -> SocketAddr {
    listener.local_addr().unwrap()
}

fn led(hwc: u16, on: bool) -> String {
    PanelCommand::SetLed { hwc: HwcId(hwc), on }
        .encode()
        .unwrap()
        .trim_end()
        .to_string()
}

fn label(hwc: u16, text: &str) -> String {
    PanelCommand::SetLabel {
        hwc: HwcId(hwc),
        label: text.to_string(),
    }
    .encode()
    .unwrap()
    .trim_end()
    .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_hub_routing_change_moves_panel_led() {
    // Arrange
    let harness = Harness::start(1).await;
    let mut panel = harness.accept_panel().await;
    assert_eq!(panel.next_line().await, led(1, true), "resync lights input 0");
    let mut hub = harness.accept_hub().await;

    // Act
    hub.send("VIDEO OUTPUT ROUTING:\n2 5\n\n").await;

    // Assert: off(previous) then on(new), addressed as index + 1
    assert_eq!(panel.next_line().await, led(1, false));
    assert_eq!(panel.next_line().await, led(6, true));

    harness.stop().await;
}

#[tokio::test]
async fn test_panel_button_press_sets_hub_crosspoint() {
    // Arrange
    let harness = Harness::start(1).await;
    let mut panel = harness.accept_panel().await;
    panel.next_line().await;
    let mut hub = harness.accept_hub().await;

    // Act
    panel.send("HWC#3=Up\nHWC#3=Down\n").await;

    // Assert
    assert_eq!(hub.next_line().await, "VIDEO OUTPUT ROUTING:");
    assert_eq!(hub.next_line().await, "2 2");
    assert_eq!(hub.next_line().await, "");

    harness.stop().await;
}

#[tokio::test]
async fn test_button_three_with_offset_two_routes_input_one() {
    let harness = Harness::start(2).await;
    let mut panel = harness.accept_panel().await;
    panel.next_line().await;
    let mut hub = harness.accept_hub().await;

    panel.send("HWC#3=Down\n").await;

    assert_eq!(hub.next_line().await, "VIDEO OUTPUT ROUTING:");
    assert_eq!(hub.next_line().await, "2 1");

    harness.stop().await;
}

#[tokio::test]
async fn test_hub_label_block_labels_every_button() {
    // Arrange
    let harness = Harness::start(1).await;
    let mut panel = harness.accept_panel().await;
    panel.next_line().await;
    let mut hub = harness.accept_hub().await;
    let mut block = String::from("INPUT LABELS:\n");
    for n in 0..16 {
        block.push_str(&format!("Source {n}\n"));
    }

    // Act
    hub.send(&block).await;

    // Assert
    for n in 0..16u16 {
        assert_eq!(panel.next_line().await, label(n + 1, &format!("Source {n}")));
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_panel_reconnect_replays_init_and_restores_state() {
    // Arrange: route input 5 and name it, then drop the panel session
    let harness = Harness::start(1).await;
    let mut panel = harness.accept_panel().await;
    panel.next_line().await;
    let mut hub = harness.accept_hub().await;
    let mut block = String::from("INPUT LABELS:\n");
    for n in 0..16 {
        block.push_str(&format!("Source {n}\n"));
    }
    block.push_str("\nVIDEO OUTPUT ROUTING:\n2 5\n\n");
    hub.send(&block).await;
    for _ in 0..18 {
        panel.next_line().await;
    }
    drop(panel);

    // Act
    let mut panel = harness.accept_panel().await;

    // Assert: every label is re-sent, then the active input is lit
    for n in 0..16u16 {
        assert_eq!(panel.next_line().await, label(n + 1, &format!("Source {n}")));
    }
    assert_eq!(panel.next_line().await, led(6, true));

    harness.stop().await;
}

#[tokio::test]
async fn test_hub_reconnect_replays_list_and_accepts_fresh_dump() {
    // Arrange
    let harness = Harness::start(1).await;
    let mut panel = harness.accept_panel().await;
    panel.next_line().await;
    let mut hub = harness.accept_hub().await;
    hub.send("VIDEO OUTPUT ROUTING:\n2 3\n\n").await;
    assert_eq!(panel.next_line().await, led(1, false));
    assert_eq!(panel.next_line().await, led(4, true));

    // Act: the hub drops mid-block and comes back with a new route
    hub.send("INPUT LABELS:\nhalf\n").await;
    assert_eq!(panel.next_line().await, label(1, "half"));
    drop(hub);
    let mut hub = harness.accept_hub().await;
    hub.send("VIDEO OUTPUT ROUTING:\n2 7\n\n").await;

    // Assert: the partial label block did not swallow the routing block
    assert_eq!(panel.next_line().await, led(4, false));
    assert_eq!(panel.next_line().await, led(8, true));

    harness.stop().await;
}
