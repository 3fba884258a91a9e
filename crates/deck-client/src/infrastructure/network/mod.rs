//! Network infrastructure: the control channel to the playback host.
//!
//! The companion app keeps exactly one WebSocket connection to the host at
//! a time.  All connection concerns live in a single driver task:
//!
//! - `ConnectionManager::new` spawns the driver and hands back a cloneable
//!   [`ChannelHandle`] plus an event receiver.
//! - The driver owns the socket, the heartbeat timer, and the reconnect
//!   timer, and multiplexes them with `select!`.  No locks are involved;
//!   the rest of the app talks to the driver through channels.
//! - Connection state is published on a `watch` channel so that
//!   [`ChannelHandle::send`] can fail fast without a round trip to the
//!   driver task.
//!
//! # Liveness
//!
//! The driver sends `ping|<nonce>` on a fixed interval.  The host is
//! considered live as long as *any* frame arrives between ticks; a matching
//! `pong` additionally yields a round-trip-time sample.  Two consecutive
//! ticks with no inbound traffic at all mark the link stale, and the driver
//! tears it down and schedules a reconnect.

pub mod backoff;

use std::time::Duration;

use deck_core::{Broadcast, Command, FrameError};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use backoff::BackoffPolicy;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

// ── Public types ──────────────────────────────────────────────────────────────

/// A saved host to connect to.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ServerProfile {
    /// Stable identifier for the profile.
    pub id: Uuid,
    /// Human-readable label shown in the UI.
    pub name: String,
    /// Hostname or IP address of the playback host.
    pub host: String,
    /// WebSocket port the host listens on.
    pub port: u16,
}

impl ServerProfile {
    /// WebSocket URL for this profile.  The host protocol is plain `ws`;
    /// there is no TLS listener on the device.
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// Lifecycle state of the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none wanted.
    Idle,
    /// First connection attempt for a profile is in flight.
    Connecting,
    /// The channel is up and commands may be sent.
    Connected,
    /// A retry attempt is in flight after an unintentional drop.
    Reconnecting,
    /// The link dropped unintentionally; a reconnect is scheduled.
    Disconnected,
}

/// Errors surfaced to callers of [`ChannelHandle`].
#[derive(Debug, Error)]
pub enum ChannelError {
    /// A command was handed over while the channel was not connected.
    /// The command is dropped, never queued.
    #[error("channel is not connected")]
    NotConnected,
    /// The driver task has shut down.
    #[error("channel driver is no longer running")]
    Closed,
    /// The command could not be encoded as a wire frame.
    #[error("frame encoding failed: {0}")]
    Frame(#[from] FrameError),
    /// The underlying WebSocket write failed.
    #[error("channel transport error: {0}")]
    Transport(String),
}

/// Tunables for the channel driver.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Interval between heartbeat pings on an established link.
    pub heartbeat_interval: Duration,
    /// Reconnect delay schedule after unintentional drops.
    pub backoff: BackoffPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(5),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Events emitted by the driver to the application layer.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The connection lifecycle state changed.
    StateChanged(ConnectionState),
    /// A frame arrived from the host (playback status, etc.).
    BroadcastReceived(Broadcast),
    /// A heartbeat pong matched its outstanding ping.
    RttSample(Duration),
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Control messages from handles to the driver task.
#[derive(Debug)]
enum ControlMsg {
    Connect(ServerProfile),
    Disconnect,
    Send(Command),
}

/// Cloneable front end to the channel driver.
///
/// All methods are synchronous: they either update the driver's mailbox or
/// fail immediately.  Nothing blocks on network I/O here.
#[derive(Clone)]
pub struct ChannelHandle {
    control_tx: mpsc::UnboundedSender<ControlMsg>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ChannelHandle {
    /// Asks the driver to connect to `profile`.
    ///
    /// A no-op if a session for some profile is already in progress; the
    /// driver finishes or is explicitly disconnected before it will take a
    /// new target.
    pub fn connect(&self, profile: ServerProfile) -> Result<(), ChannelError> {
        self.control_tx
            .send(ControlMsg::Connect(profile))
            .map_err(|_| ChannelError::Closed)
    }

    /// Tears the channel down on purpose.
    ///
    /// Cancels any pending reconnect timer and moves the channel to
    /// [`ConnectionState::Idle`]; no automatic reconnect follows.
    pub fn disconnect(&self) -> Result<(), ChannelError> {
        self.control_tx
            .send(ControlMsg::Disconnect)
            .map_err(|_| ChannelError::Closed)
    }

    /// Hands a command to the driver for transmission.
    ///
    /// Fails with [`ChannelError::NotConnected`] unless the channel is
    /// currently connected.  Commands are never queued for later delivery;
    /// a dropped command is the caller's signal to re-sync state once the
    /// link returns.
    pub fn send(&self, command: Command) -> Result<(), ChannelError> {
        if *self.state_rx.borrow() != ConnectionState::Connected {
            return Err(ChannelError::NotConnected);
        }
        self.control_tx
            .send(ControlMsg::Send(command))
            .map_err(|_| ChannelError::Closed)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// A watch receiver for callers that want to await state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Spawns the channel driver task.
pub struct ConnectionManager;

impl ConnectionManager {
    /// Spawns the driver on the current Tokio runtime.
    ///
    /// Returns a handle for issuing commands and a receiver for channel
    /// events.  The driver runs until every [`ChannelHandle`] clone has
    /// been dropped.
    pub fn new(config: ChannelConfig) -> (ChannelHandle, mpsc::Receiver<ChannelEvent>) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let driver = Driver {
            config,
            control_rx,
            event_tx,
            state_tx,
        };
        tokio::spawn(driver.run());

        let handle = ChannelHandle {
            control_tx,
            state_rx,
        };
        (handle, event_rx)
    }
}

/// An outstanding heartbeat ping awaiting its pong.
struct PendingHeartbeat {
    nonce: String,
    sent_at: Instant,
}

/// How an established link ended.
enum LinkOutcome {
    /// The caller asked for a disconnect.
    Manual,
    /// The transport failed or the host went silent.
    Lost,
    /// All handles were dropped.
    Shutdown,
}

struct Driver {
    config: ChannelConfig,
    control_rx: mpsc::UnboundedReceiver<ControlMsg>,
    event_tx: mpsc::Sender<ChannelEvent>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Driver {
    /// Top-level loop: wait in idle for a connect request, run the session
    /// to completion, return to idle.
    async fn run(mut self) {
        loop {
            let profile = match self.control_rx.recv().await {
                Some(ControlMsg::Connect(profile)) => profile,
                // Disconnect while idle is a no-op; a Send while idle was
                // already rejected at the handle.
                Some(ControlMsg::Disconnect) | Some(ControlMsg::Send(_)) => continue,
                None => return,
            };
            info!(host = %profile.host, port = profile.port, "starting channel session");
            if let LinkOutcome::Shutdown = self.run_session(profile).await {
                return;
            }
        }
    }

    /// Connect/reconnect loop for a single profile.
    ///
    /// Returns on manual disconnect (after publishing `Idle`) or when the
    /// last handle drops.  Unintentional drops never return; they schedule
    /// a retry and loop.
    async fn run_session(&mut self, profile: ServerProfile) -> LinkOutcome {
        let mut attempts: u32 = 0;
        loop {
            let attempt_state = if attempts == 0 {
                ConnectionState::Connecting
            } else {
                ConnectionState::Reconnecting
            };
            self.set_state(attempt_state).await;

            match connect_async(profile.url()).await {
                Ok((socket, _response)) => {
                    info!(url = %profile.url(), "channel established");
                    attempts = 0;
                    self.set_state(ConnectionState::Connected).await;
                    match self.drive_link(socket).await {
                        LinkOutcome::Manual => {
                            self.set_state(ConnectionState::Idle).await;
                            return LinkOutcome::Manual;
                        }
                        LinkOutcome::Shutdown => return LinkOutcome::Shutdown,
                        LinkOutcome::Lost => {
                            self.set_state(ConnectionState::Disconnected).await;
                        }
                    }
                }
                Err(err) => {
                    warn!(url = %profile.url(), error = %err, "connection attempt failed");
                    self.set_state(ConnectionState::Disconnected).await;
                }
            }

            let delay = self.config.backoff.delay(attempts);
            attempts = attempts.saturating_add(1);
            debug!(attempt = attempts, ?delay, "scheduling reconnect");
            match self.wait_for_retry(delay).await {
                RetryWait::Elapsed => {}
                RetryWait::Cancelled => {
                    self.set_state(ConnectionState::Idle).await;
                    return LinkOutcome::Manual;
                }
                RetryWait::Shutdown => return LinkOutcome::Shutdown,
            }
        }
    }

    /// Sleeps out the backoff delay while staying responsive to control
    /// messages.  A manual disconnect cancels the pending retry.
    async fn wait_for_retry(&mut self, delay: Duration) -> RetryWait {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return RetryWait::Elapsed,
                msg = self.control_rx.recv() => match msg {
                    Some(ControlMsg::Disconnect) => return RetryWait::Cancelled,
                    // Already working on a session; a second connect request
                    // does not restart the schedule.
                    Some(ControlMsg::Connect(_)) => {}
                    // Raced the drop; the command is discarded.
                    Some(ControlMsg::Send(command)) => {
                        debug!(?command, "dropping command issued while disconnected");
                    }
                    None => return RetryWait::Shutdown,
                },
            }
        }
    }

    /// Runs an established link until it ends.
    ///
    /// Owns the heartbeat schedule: at most one ping is outstanding, and the
    /// stale check only fires when a full interval passes with no inbound
    /// frame of any kind.
    async fn drive_link(&mut self, socket: WebSocketStream<MaybeTlsStream<TcpStream>>) -> LinkOutcome {
        let (mut sink, mut stream) = socket.split();

        // Ask for the current playback status right away so the UI does not
        // sit on a stale "unknown" indicator until the host volunteers one.
        if let Err(err) = send_command(&mut sink, &Command::MacroQuery).await {
            warn!(error = %err, "initial status query failed");
            return LinkOutcome::Lost;
        }

        let mut ticker = interval(self.config.heartbeat_interval);
        // The first tick of a tokio interval fires immediately; consume it
        // so the first ping goes out one full interval after connecting.
        ticker.tick().await;

        let mut pending: Option<PendingHeartbeat> = None;
        let mut awaiting_reply = false;

        loop {
            tokio::select! {
                msg = self.control_rx.recv() => match msg {
                    Some(ControlMsg::Send(command)) => {
                        if let Err(err) = send_command(&mut sink, &command).await {
                            warn!(error = %err, "send failed, dropping link");
                            return LinkOutcome::Lost;
                        }
                    }
                    Some(ControlMsg::Disconnect) => {
                        info!("disconnecting on request");
                        let _ = sink.close().await;
                        return LinkOutcome::Manual;
                    }
                    Some(ControlMsg::Connect(_)) => {
                        debug!("connect requested while already connected; ignoring");
                    }
                    None => {
                        let _ = sink.close().await;
                        return LinkOutcome::Shutdown;
                    }
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        // Any inbound frame proves the host is alive, even
                        // one we cannot parse.
                        awaiting_reply = false;
                        self.handle_frame(&text, &mut pending).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!("host closed the channel");
                        return LinkOutcome::Lost;
                    }
                    Some(Ok(_)) => {
                        // Binary and control frames are not part of the
                        // protocol; transport-level pings are answered by
                        // tungstenite itself.
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "channel read error");
                        return LinkOutcome::Lost;
                    }
                },
                _ = ticker.tick() => {
                    if awaiting_reply {
                        warn!("no traffic since last heartbeat, marking link stale");
                        return LinkOutcome::Lost;
                    }
                    let nonce = Uuid::new_v4().simple().to_string();
                    if let Err(err) = send_command(&mut sink, &Command::Ping(nonce.clone())).await {
                        warn!(error = %err, "heartbeat send failed, dropping link");
                        return LinkOutcome::Lost;
                    }
                    pending = Some(PendingHeartbeat {
                        nonce,
                        sent_at: Instant::now(),
                    });
                    awaiting_reply = true;
                }
            }
        }
    }

    /// Parses one inbound frame and emits the matching events.
    async fn handle_frame(&mut self, text: &str, pending: &mut Option<PendingHeartbeat>) {
        let broadcast = Broadcast::parse(text);
        if let Broadcast::Pong(nonce) = &broadcast {
            // Only a matching nonce clears the outstanding probe; a stale or
            // unsolicited pong already counted for liveness above.
            if pending.as_ref().map_or(false, |hb| hb.nonce == *nonce) {
                if let Some(hb) = pending.take() {
                    let rtt = hb.sent_at.elapsed();
                    debug!(?rtt, "heartbeat pong");
                    self.emit(ChannelEvent::RttSample(rtt)).await;
                }
            } else {
                debug!(nonce = %nonce, "pong with no matching probe");
            }
            return;
        }
        match broadcast {
            Broadcast::Unrecognized(raw) => {
                debug!(frame = %raw, "ignoring unrecognized frame");
            }
            other => self.emit(ChannelEvent::BroadcastReceived(other)).await,
        }
    }

    async fn set_state(&mut self, state: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            debug!(?state, "channel state changed");
            self.emit(ChannelEvent::StateChanged(state)).await;
        }
    }

    async fn emit(&mut self, event: ChannelEvent) {
        // The application dropping its receiver is not an error for the
        // driver; it keeps the link alive regardless.
        let _ = self.event_tx.send(event).await;
    }
}

enum RetryWait {
    Elapsed,
    Cancelled,
    Shutdown,
}

/// Encodes and transmits one command frame.
async fn send_command(sink: &mut WsSink, command: &Command) -> Result<(), ChannelError> {
    let frame = command.encode()?;
    sink.send(Message::Text(frame))
        .await
        .map_err(|err| {
            error!(error = %err, "websocket write failed");
            ChannelError::Transport(err.to_string())
        })
}
