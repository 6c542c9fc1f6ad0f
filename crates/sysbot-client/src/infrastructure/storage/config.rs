//! TOML configuration for the sysbot client.
//!
//! The default file lives in the platform config directory:
//! - Windows:  `%APPDATA%\sysbot\config.toml`
//! - Linux:    `~/.config/sysbot/config.toml`
//! - macOS:    `~/Library/Application Support/sysbot/config.toml`
//!
//! Example:
//!
//! ```toml
//! [console]
//! host = "192.168.1.42"
//! port = 6000
//!
//! [session]
//! binary_timeout_ms = 15000
//!
//! [icon]
//! pixel_peek_fallback = true
//! ```
//!
//! Every field has a serde default, so a partial file (or no file at all)
//! loads.  Command-line flags override whatever the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::configure_session::ControllerConfig;
use crate::application::query_game::IconOptions;
use crate::infrastructure::network::SessionConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub controller: ControllerSection,
    #[serde(default)]
    pub icon: IconSection,
    #[serde(default)]
    pub log: LogSection,
}

/// Where the peer listens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Transport timing, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSection {
    /// Delay after every command.  Lowering it below the peer's main-loop
    /// cadence causes dropped commands.
    #[serde(default = "default_command_delay_ms")]
    pub command_delay_ms: u64,
    #[serde(default = "default_text_timeout_ms")]
    pub text_timeout_ms: u64,
    #[serde(default = "default_binary_timeout_ms")]
    pub binary_timeout_ms: u64,
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// Values pushed to the peer by the `configure` handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControllerSection {
    #[serde(default = "default_controller_type")]
    pub controller_type: u8,
    #[serde(default = "default_sleep_ms")]
    pub button_click_sleep_ms: u32,
    #[serde(default = "default_sleep_ms")]
    pub main_loop_sleep_ms: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IconSection {
    /// Retry a failed `game icon` with `pixelPeek`.  Off unless set.
    #[serde(default)]
    pub pixel_peek_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogSection {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    6000
}
fn default_command_delay_ms() -> u64 {
    50
}
fn default_text_timeout_ms() -> u64 {
    2_000
}
fn default_binary_timeout_ms() -> u64 {
    10_000
}
fn default_read_buffer_size() -> usize {
    4096
}
fn default_controller_type() -> u8 {
    3
}
fn default_sleep_ms() -> u32 {
    50
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            command_delay_ms: default_command_delay_ms(),
            text_timeout_ms: default_text_timeout_ms(),
            binary_timeout_ms: default_binary_timeout_ms(),
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            controller_type: default_controller_type(),
            button_click_sleep_ms: default_sleep_ms(),
            main_loop_sleep_ms: default_sleep_ms(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Conversions to runtime settings ───────────────────────────────────────────

impl AppConfig {
    /// `host:port` of the peer.
    pub fn address(&self) -> String {
        format!("{}:{}", self.console.host, self.console.port)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            command_delay: Duration::from_millis(self.session.command_delay_ms),
            text_timeout: Duration::from_millis(self.session.text_timeout_ms),
            binary_timeout: Duration::from_millis(self.session.binary_timeout_ms),
            read_buffer_size: self.session.read_buffer_size.max(1),
            ..SessionConfig::default()
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            controller_type: self.controller.controller_type,
            button_click_sleep_ms: self.controller.button_click_sleep_ms,
            main_loop_sleep_ms: self.controller.main_loop_sleep_ms,
        }
    }

    pub fn icon_options(&self) -> IconOptions {
        IconOptions {
            pixel_peek_fallback: self.icon.pixel_peek_fallback,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let dir = platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(dir.join("config.toml"))
}

/// Loads the config from the default path.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning the defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
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
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("sysbot"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("sysbot"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("sysbot")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
