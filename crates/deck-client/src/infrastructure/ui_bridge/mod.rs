//! Observable application state for a render layer.
//!
//! The companion app's UI (whatever front end ends up driving it) only needs
//! a handful of facts to paint the deck: is the channel up, is a macro
//! playing on the host, how fresh is the link, should alternate labels be
//! shown, and which layout variant is active.  [`DeckAppState`] holds those
//! facts behind async mutexes so the channel event loop and a render layer
//! can share it, and [`DeckStatusDto`] is the serializable snapshot handed
//! across the presentation boundary.
//!
//! All fields use `tokio::sync::Mutex` rather than `std::sync::Mutex`: the
//! writers run inside async tasks, and an async mutex suspends the task
//! instead of blocking the runtime thread.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::infrastructure::network::ConnectionState;

/// What the host last reported about macro playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// A macro is currently being replayed.
    Playing,
    /// No macro is running.
    Stopped,
    /// No status broadcast has arrived yet on this connection.
    Unknown,
}

/// Shared state between the channel event loop and a render layer.
pub struct DeckAppState {
    /// Lifecycle state of the control channel.
    pub connection: Mutex<ConnectionState>,
    /// Host playback status from the most recent broadcast.
    pub playback: Mutex<PlaybackStatus>,
    /// Most recent heartbeat round-trip time, if any pong has matched.
    pub last_rtt: Mutex<Option<Duration>>,
    /// Whether at least one modifier element is currently held.
    pub modifier_active: Mutex<bool>,
    /// Name of the layout variant currently resolved for the viewport.
    pub active_layout: Mutex<Option<String>>,
}

impl DeckAppState {
    pub fn new() -> Self {
        Self {
            connection: Mutex::new(ConnectionState::Idle),
            playback: Mutex::new(PlaybackStatus::Unknown),
            last_rtt: Mutex::new(None),
            modifier_active: Mutex::new(false),
            active_layout: Mutex::new(None),
        }
    }

    /// Takes a consistent snapshot for the presentation boundary.
    pub async fn snapshot(&self) -> DeckStatusDto {
        DeckStatusDto {
            connection_state: connection_state_label(*self.connection.lock().await).to_string(),
            playback_state: playback_label(*self.playback.lock().await).to_string(),
            last_rtt_ms: self.last_rtt.lock().await.map(|d| d.as_millis() as u64),
            modifier_active: *self.modifier_active.lock().await,
            active_layout: self.active_layout.lock().await.clone(),
        }
    }
}

impl Default for DeckAppState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Data Transfer Objects (presentation boundary) ─────────────────────────────

/// Serializable snapshot of [`DeckAppState`].
///
/// Contains only JSON-friendly field types so any front end can consume it
/// without knowing the internal enums.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckStatusDto {
    pub connection_state: String,
    pub playback_state: String,
    /// Milliseconds; absent until a heartbeat pong has matched.
    pub last_rtt_ms: Option<u64>,
    pub modifier_active: bool,
    /// Resolved layout variant name; absent before the first resolution.
    pub active_layout: Option<String>,
}

fn connection_state_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Idle => "idle",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Connected => "connected",
        ConnectionState::Reconnecting => "reconnecting",
        ConnectionState::Disconnected => "disconnected",
    }
}

fn playback_label(status: PlaybackStatus) -> &'static str {
    match status {
        PlaybackStatus::Playing => "playing",
        PlaybackStatus::Stopped => "stopped",
        PlaybackStatus::Unknown => "unknown",
    }
}
