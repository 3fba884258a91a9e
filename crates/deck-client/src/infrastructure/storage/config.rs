//! TOML-based configuration persistence for the companion app.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Touchdeck\config.toml`
//! - Linux:    `~/.config/touchdeck/config.toml`
//! - macOS:    `~/Library/Application Support/Touchdeck/config.toml`
//!
//! Every field carries a serde default so the app works on first run
//! (no file at all) and after upgrades that introduce new fields.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::infrastructure::network::backoff::BackoffPolicy;
use crate::infrastructure::network::{self, ServerProfile};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Saved playback hosts.
    #[serde(default)]
    pub profiles: Vec<ProfileEntry>,
}

/// General client behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Schema version string, bumped on breaking changes.
    #[serde(default = "default_version")]
    pub version: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Name of the profile to connect to on startup; absent means the first
    /// saved profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
}

/// Timing settings for the control channel, stored in milliseconds.
///
/// Converted to the runtime [`network::ChannelConfig`] (which uses
/// `Duration`) via [`ChannelConfig::runtime`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    /// Interval between heartbeat pings.
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_interval_ms: u64,
    /// Backoff ceiling for the first reconnect attempt.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Upper bound on the reconnect delay ceiling.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
}

impl ChannelConfig {
    /// Converts the persisted millisecond values to the driver's runtime
    /// configuration.
    pub fn runtime(&self) -> network::ChannelConfig {
        network::ChannelConfig {
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            backoff: BackoffPolicy {
                base: Duration::from_millis(self.backoff_base_ms),
                cap: Duration::from_millis(self.backoff_cap_ms),
            },
        }
    }
}

/// Persisted record of a playback host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileEntry {
    /// Stable identifier; generated when the entry is first written.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Display name shown in the UI.
    pub name: String,
    /// Hostname or IP address of the host.
    pub host: String,
    /// WebSocket port the host listens on.
    #[serde(default = "default_ws_port")]
    pub port: u16,
}

impl ProfileEntry {
    /// Runtime profile for the channel driver.
    pub fn profile(&self) -> ServerProfile {
        ServerProfile {
            id: self.id,
            name: self.name.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_version() -> String {
    "1.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_heartbeat_ms() -> u64 {
    5_000
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_backoff_cap_ms() -> u64 {
    30_000
}
fn default_ws_port() -> u16 {
    8765
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            channel: ChannelConfig::default(),
            profiles: Vec::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
            default_profile: None,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory and the file
/// if they do not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &std::path::Path, config: &AppConfig) -> Result<(), ConfigError> {
    // Ensure directory exists before writing.
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Persists `config` to the platform config path.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Resolves the platform config base directory including the `Touchdeck`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Touchdeck"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("touchdeck"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/Touchdeck
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Touchdeck")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_has_documented_channel_timings() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.channel.heartbeat_interval_ms, 5_000);
        assert_eq!(cfg.channel.backoff_base_ms, 500);
        assert_eq!(cfg.channel.backoff_cap_ms, 30_000);
    }

    #[test]
    fn test_app_config_default_has_no_profiles() {
        let cfg = AppConfig::default();
        assert!(cfg.profiles.is_empty());
        assert!(cfg.client.default_profile.is_none());
    }

    #[test]
    fn test_client_config_default_log_level_is_info() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_channel_config_converts_to_runtime_durations() {
        let cfg = ChannelConfig {
            heartbeat_interval_ms: 2_000,
            backoff_base_ms: 250,
            backoff_cap_ms: 10_000,
        };
        let runtime = cfg.runtime();
        assert_eq!(runtime.heartbeat_interval, Duration::from_secs(2));
        assert_eq!(runtime.backoff.base, Duration::from_millis(250));
        assert_eq!(runtime.backoff.cap, Duration::from_secs(10));
    }

    // ── TOML parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_round_trips_through_toml() {
        let mut cfg = AppConfig::default();
        cfg.channel.heartbeat_interval_ms = 3_000;
        cfg.profiles.push(ProfileEntry {
            id: Uuid::new_v4(),
            name: "living room pi".to_string(),
            host: "192.168.1.50".to_string(),
            port: 8765,
        });

        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let toml_str = r#"
            [[profiles]]
            name = "bench rig"
            host = "10.0.0.7"
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize");
        assert_eq!(cfg.profiles.len(), 1);
        assert_eq!(cfg.profiles[0].port, 8765);
        assert_eq!(cfg.client.log_level, "info");
        assert_eq!(cfg.channel.backoff_cap_ms, 30_000);
    }

    #[test]
    fn test_profile_entry_converts_to_server_profile() {
        let entry = ProfileEntry {
            id: Uuid::nil(),
            name: "bench rig".to_string(),
            host: "10.0.0.7".to_string(),
            port: 9000,
        };
        let profile = entry.profile();
        assert_eq!(profile.url(), "ws://10.0.0.7:9000");
        assert_eq!(profile.name, "bench rig");
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        let dir = std::env::temp_dir().join(format!("touchdeck-test-{}", Uuid::new_v4().simple()));
        let path = dir.join("nested").join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.client.default_profile = Some("bench rig".to_string());
        cfg.channel.backoff_cap_ms = 12_000;
        cfg.profiles.push(ProfileEntry {
            id: Uuid::new_v4(),
            name: "bench rig".to_string(),
            host: "10.0.0.7".to_string(),
            port: 9000,
        });

        // The nested directory does not exist yet; save must create it.
        save_config_to(&path, &cfg).expect("save");
        let restored = load_config_from(&path).expect("load");
        assert_eq!(cfg, restored);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("touchdeck-test-no-such-config.toml");
        let cfg = load_config_from(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }
}
