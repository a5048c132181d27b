//! Optional TOML settings file for the server.
//!
//! Every field has a serde default, so an empty file (or a file that only sets
//! one value) is valid.  Example:
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! port = 3000
//! log_level = "info"
//!
//! [midi]
//! preferred_token = "Bus 2"
//! fallback_token = "IAC"
//! poll_interval_secs = 2
//! client_name = "pageturn"
//! ```
//!
//! # Serde default values (for beginners)
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  The default
//! functions below return the same values as [`ServerConfig::default`], so
//! "no file" and "empty file" configure the server identically.
//!
//! Command-line flags and environment variables are applied on top of the
//! file in `main.rs`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use pageturn_core::domain::device::{DEFAULT_FALLBACK_TOKEN, DEFAULT_PREFERRED_TOKEN};
use pageturn_core::DevicePreference;

use crate::domain::config::{DEFAULT_MIDI_CLIENT_NAME, DEFAULT_PORT, DEFAULT_POLL_INTERVAL};
use crate::domain::ServerConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `bind_address` is not an IP address.
    #[error("invalid bind address \"{0}\"")]
    InvalidBindAddress(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level layout of the settings file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub midi: MidiSection,
}

/// `[server]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerSection {
    /// IP address to bind to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// `[midi]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MidiSection {
    #[serde(default = "default_preferred_token")]
    pub preferred_token: String,
    #[serde(default = "default_fallback_token")]
    pub fallback_token: String,
    /// Hot-plug polling period in seconds.  Zero is clamped to one.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_preferred_token() -> String {
    DEFAULT_PREFERRED_TOKEN.to_string()
}
fn default_fallback_token() -> String {
    DEFAULT_FALLBACK_TOKEN.to_string()
}
fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_client_name() -> String {
    DEFAULT_MIDI_CLIENT_NAME.to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for MidiSection {
    fn default() -> Self {
        Self {
            preferred_token: default_preferred_token(),
            fallback_token: default_fallback_token(),
            poll_interval_secs: default_poll_interval_secs(),
            client_name: default_client_name(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl FileConfig {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Converts the file settings into a [`ServerConfig`].
    ///
    /// The device hint is never read from the file; it is a launch argument.
    pub fn into_server_config(self) -> Result<ServerConfig, ConfigError> {
        let ip: IpAddr = self
            .server
            .bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.server.bind_address.clone()))?;

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, self.server.port),
            device_hint: None,
            preference: DevicePreference {
                preferred_token: self.midi.preferred_token,
                fallback_token: self.midi.fallback_token,
            },
            poll_interval: Duration::from_secs(self.midi.poll_interval_secs.max(1)),
            midi_client_name: self.midi.client_name,
            log_level: self.server.log_level,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
