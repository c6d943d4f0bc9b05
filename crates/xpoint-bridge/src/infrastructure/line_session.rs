//! Reconnecting, line-oriented TCP session shared by both device links.
//!
//! Each link owns one [`LineSession`], which runs two tasks:
//!
//! - a **supervisor** that connects, sends the device's init lines, reads
//!   newline-terminated lines until the session ends, then backs off and
//!   reconnects for as long as the `running` flag is set;
//! - a **writer** that drains the outbound queue onto whichever connection is
//!   current.
//!
//! # Write ordering
//!
//! Sink calls only enqueue.  Commands enqueued one after another on the same
//! session are written in that order, and a stalled socket never blocks the
//! caller's event pump.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::application::BridgeError;
use crate::domain::ReconnectPolicy;
use crate::infrastructure::backoff::Backoff;
use crate::infrastructure::{LinkError, LinkEvent};

/// Longest line accepted from a device, terminator included.  Longer lines
/// are discarded up to their next `\n`.
pub const MAX_LINE_LEN: usize = 4096;

/// Turns raw device lines into link events.
///
/// Decoders log and swallow malformed lines themselves; returning `None`
/// simply means "nothing to report".
pub trait LineDecoder: Send + 'static {
    /// The event type produced for this device.
    type Event: Send + 'static;

    /// Called at the start of every session to drop partial state.
    fn reset(&mut self);

    /// Decodes one line (without its terminator).
    fn decode(&mut self, line: &str) -> Option<Self::Event>;
}

/// Connection parameters and shared write side of one device session.
pub struct LineSession {
    name: &'static str,
    addr: SocketAddr,
    init: &'static [&'static str],
    policy: ReconnectPolicy,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
    connected: AtomicBool,
    queue: mpsc::Sender<String>,
}

impl LineSession {
    /// Creates a session and spawns its writer task.
    ///
    /// Must be called from within a Tokio runtime.  No connection is made
    /// until [`LineSession::supervise`] runs.
    pub fn start(
        name: &'static str,
        addr: SocketAddr,
        init: &'static [&'static str],
        policy: ReconnectPolicy,
        queue_capacity: usize,
    ) -> Arc<Self> {
        let (queue, rx) = mpsc::channel(queue_capacity.max(1));
        let writer = Arc::new(Mutex::new(None));
        tokio::spawn(write_queued(name, rx, Arc::clone(&writer)));

        Arc::new(Self {
            name,
            addr,
            init,
            policy,
            writer,
            connected: AtomicBool::new(false),
            queue,
        })
    }

    /// Returns `true` while a session is established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Queues one encoded command without waiting.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotConnected`] if no session is up, or
    /// [`BridgeError::QueueFull`] if the writer has fallen behind.  The
    /// command is dropped in both cases.
    pub fn enqueue(&self, line: String) -> Result<(), BridgeError> {
        if !self.is_connected() {
            return Err(BridgeError::NotConnected { link: self.name });
        }
        self.queue.try_send(line).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => BridgeError::QueueFull { link: self.name },
            mpsc::error::TrySendError::Closed(_) => BridgeError::NotConnected { link: self.name },
        })
    }

    /// Keeps a session alive until `running` is cleared or `events` closes.
    pub async fn supervise<D: LineDecoder>(
        self: Arc<Self>,
        mut decoder: D,
        events: mpsc::Sender<LinkEvent<D::Event>>,
        running: Arc<AtomicBool>,
    ) {
        let mut backoff = Backoff::new(self.policy);

        while running.load(Ordering::Relaxed) {
            match self.connect().await {
                Ok(read_half) => {
                    info!("{} connected at {}", self.name, self.addr);
                    backoff.reset();
                    decoder.reset();
                    if events.send(LinkEvent::Connected).await.is_err() {
                        self.drop_connection().await;
                        return;
                    }

                    let outcome = read_lines(self.name, read_half, &mut decoder, &events).await;
                    self.drop_connection().await;

                    match outcome {
                        Err(LinkError::ConsumerGone { .. }) => return,
                        Err(e) => warn!("{e}"),
                        Ok(()) => {}
                    }
                    if events.send(LinkEvent::Disconnected).await.is_err() {
                        return;
                    }
                }
                Err(e) => warn!("{e}"),
            }

            if !running.load(Ordering::Relaxed) {
                break;
            }
            let delay = backoff.next_delay();
            info!("{} reconnecting in {delay:?}", self.name);
            sleep(delay).await;
        }
        debug!("{} supervisor stopped", self.name);
    }

    /// Opens the TCP connection, sends the init lines and installs the
    /// write half for the writer task.
    async fn connect(&self) -> Result<OwnedReadHalf, LinkError> {
        let stream = TcpStream::connect(self.addr)
            .await
            .map_err(|source| LinkError::ConnectFailed {
                link: self.name,
                addr: self.addr,
                source,
            })?;
        let (read_half, mut write_half) = stream.into_split();

        for line in self.init {
            write_half
                .write_all(line.as_bytes())
                .await
                .map_err(|source| LinkError::Io {
                    link: self.name,
                    source,
                })?;
        }

        *self.writer.lock().await = Some(write_half);
        self.connected.store(true, Ordering::Release);
        Ok(read_half)
    }

    async fn drop_connection(&self) {
        self.connected.store(false, Ordering::Release);
        *self.writer.lock().await = None;
        info!("{} disconnected", self.name);
    }
}

/// Reads lines from `reader` until EOF or an error, forwarding every decoded
/// event to `events`.
///
/// Lines are split on `\n`; a trailing `\r` is removed and invalid UTF-8 is
/// replaced rather than treated as fatal.  A line longer than
/// [`MAX_LINE_LEN`] is dropped with a warning.
///
/// # Errors
///
/// [`LinkError::Closed`] on EOF, [`LinkError::Io`] on a read failure and
/// [`LinkError::ConsumerGone`] if `events` has been closed.
pub async fn read_lines<R, D>(
    name: &'static str,
    reader: R,
    decoder: &mut D,
    events: &mpsc::Sender<LinkEvent<D::Event>>,
) -> Result<(), LinkError>
where
    R: AsyncRead + Unpin,
    D: LineDecoder,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    let mut overlong = false;

    loop {
        buf.clear();
        let n = (&mut reader)
            .take(MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| LinkError::Io { link: name, source })?;
        if n == 0 {
            return Err(LinkError::Closed { link: name });
        }

        let terminated = buf.last() == Some(&b'\n');
        if overlong {
            overlong = !terminated;
            continue;
        }
        if !terminated && n == MAX_LINE_LEN {
            warn!("{name} sent a line over {MAX_LINE_LEN} bytes; discarding it");
            overlong = true;
            continue;
        }

        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches('\n').trim_end_matches('\r');
        debug!("{name} → {line:?}");

        if let Some(event) = decoder.decode(line) {
            if events.send(LinkEvent::Message(event)).await.is_err() {
                return Err(LinkError::ConsumerGone { link: name });
            }
        }
    }
}

/// Writer task: drains `rx` onto the current connection.
///
/// Ends when every sender has been dropped.
async fn write_queued(
    name: &'static str,
    mut rx: mpsc::Receiver<String>,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
) {
    while let Some(line) = rx.recv().await {
        let mut guard = writer.lock().await;
        match guard.as_mut() {
            Some(w) => {
                if let Err(e) = w.write_all(line.as_bytes()).await {
                    error!("failed to send command to {name}: {e}");
                }
            }
            None => warn!("{name} not connected; dropping command {:?}", line.trim_end()),
        }
    }
    debug!("{name} writer stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
