//! Touchdeck companion client — entry point.
//!
//! Connects to a macro-playback host over WebSocket and keeps the shared
//! [`DeckAppState`] in sync with what the channel reports: connection
//! lifecycle, host playback status, and heartbeat round-trip times.  A
//! render layer reads that state; this binary owns the event loop behind
//! it.
//!
//! # Usage
//!
//! ```text
//! deck-client [OPTIONS]
//!
//! Options:
//!   --config  <PATH>   Path to config.toml [default: platform config dir]
//!   --host    <HOST>   Connect to this host, bypassing saved profiles
//!   --port    <PORT>   Port for --host [default: 8765]
//!   --profile <NAME>   Connect to the saved profile with this name
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable            | Description                         |
//! |---------------------|-------------------------------------|
//! | `TOUCHDECK_CONFIG`  | Path to the config file             |
//! | `TOUCHDECK_HOST`    | Host to connect to                  |
//! | `TOUCHDECK_PORT`    | Port for the host override          |
//! | `TOUCHDECK_PROFILE` | Saved profile name                  |
//!
//! Log output is controlled by `RUST_LOG`; when unset, the `log_level`
//! from the config file applies.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use deck_core::Broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use deck_client::infrastructure::network::{
    ChannelEvent, ConnectionManager, ConnectionState, ServerProfile,
};
use deck_client::infrastructure::storage::config::{
    config_file_path, load_config_from, AppConfig,
};
use deck_client::infrastructure::ui_bridge::{DeckAppState, PlaybackStatus};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Touchdeck companion client.
///
/// Turns this machine into a touch control surface for a macro-playback
/// host reachable over WebSocket.
#[derive(Debug, Parser)]
#[command(
    name = "deck-client",
    about = "Touch control surface client for a macro-playback host",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// Defaults to the platform config directory
    /// (e.g. `~/.config/touchdeck/config.toml` on Linux).
    #[arg(long, env = "TOUCHDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Host to connect to, bypassing saved profiles.
    #[arg(long, env = "TOUCHDECK_HOST")]
    host: Option<String>,

    /// WebSocket port used together with `--host`.
    #[arg(long, default_value_t = 8765, env = "TOUCHDECK_PORT")]
    port: u16,

    /// Name of the saved profile to connect to.
    ///
    /// Without this flag the config's `default_profile` applies, falling
    /// back to the first saved profile.
    #[arg(long, env = "TOUCHDECK_PROFILE")]
    profile: Option<String>,
}

/// Picks the connection target from the CLI override or the saved profiles.
fn select_profile(cli: &Cli, config: &AppConfig) -> anyhow::Result<ServerProfile> {
    if let Some(host) = &cli.host {
        return Ok(ServerProfile {
            id: Uuid::new_v4(),
            name: format!("{}:{}", host, cli.port),
            host: host.clone(),
            port: cli.port,
        });
    }

    let wanted = cli
        .profile
        .as_deref()
        .or(config.client.default_profile.as_deref());

    match wanted {
        Some(name) => config
            .profiles
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.profile())
            .with_context(|| format!("no saved profile named {name:?}")),
        None => match config.profiles.first() {
            Some(entry) => Ok(entry.profile()),
            None => bail!("no host configured; pass --host or add a profile to the config file"),
        },
    }
}

/// Applies one channel event to the shared state.
async fn apply_event(state: &DeckAppState, event: ChannelEvent) {
    match event {
        ChannelEvent::StateChanged(new_state) => {
            *state.connection.lock().await = new_state;
            if new_state != ConnectionState::Connected {
                // The host's status and link timing are meaningless across
                // a gap; the post-reconnect status query refreshes them.
                *state.playback.lock().await = PlaybackStatus::Unknown;
                *state.last_rtt.lock().await = None;
            }
        }
        ChannelEvent::BroadcastReceived(Broadcast::MacroPlaying) => {
            info!("host reports macro playing");
            *state.playback.lock().await = PlaybackStatus::Playing;
        }
        ChannelEvent::BroadcastReceived(Broadcast::MacroStopped) => {
            info!("host reports macro stopped");
            *state.playback.lock().await = PlaybackStatus::Stopped;
        }
        ChannelEvent::BroadcastReceived(other) => {
            warn!(?other, "unexpected broadcast reached the event loop");
        }
        ChannelEvent::RttSample(rtt) => {
            *state.last_rtt.lock().await = Some(rtt);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config must load before tracing so its log_level can act as the
    // fallback filter when RUST_LOG is unset.
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path()?,
    };
    let config = load_config_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.client.log_level)),
        )
        .init();

    let profile = select_profile(&cli, &config)?;
    info!(
        host = %profile.host,
        port = profile.port,
        profile = %profile.name,
        "Touchdeck client starting"
    );

    let state = Arc::new(DeckAppState::new());
    let (handle, mut events) = ConnectionManager::new(config.channel.runtime());
    handle.connect(profile)?;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!("failed to listen for Ctrl+C signal: {e}");
                }
                info!("shutting down");
                let _ = handle.disconnect();
                break;
            }
            event = events.recv() => match event {
                Some(event) => apply_event(&state, event).await,
                None => break,
            },
        }
    }

    info!("Touchdeck client stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
