//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It is built once in `main.rs` by merging CLI flags, environment variables
//! and the optional TOML file (see `infrastructure::config_file`), in that
//! order of precedence, on top of [`ServerConfig::default`].
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! reads inside the domain) makes the server easy to embed in tests.

use std::net::SocketAddr;
use std::time::Duration;

use pageturn_core::DevicePreference;

/// Default WebSocket listener port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default registry polling period used for hot-plug detection.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client name announced to the OS MIDI stack.
pub const DEFAULT_MIDI_CLIENT_NAME: &str = "pageturn";

/// All runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port the WebSocket server binds to.
    ///
    /// `0.0.0.0` accepts connections from any interface, which is what a
    /// tablet on the same LAN needs.
    pub bind_addr: SocketAddr,

    /// Optional launch argument naming the MIDI input to prefer at startup.
    ///
    /// Matched as a case-insensitive substring.  Only consulted once, by the
    /// initial selection; viewers can switch input later.
    pub device_hint: Option<String>,

    /// Name tokens for the startup fallbacks (`"Bus 2"`, then `"IAC"`).
    pub preference: DevicePreference,

    /// How often the MIDI registry is re-queried to notice unplugged or newly
    /// plugged inputs.
    pub poll_interval: Duration,

    /// Client name announced to the OS MIDI stack when opening inputs.
    pub midi_client_name: String,

    /// Fallback `tracing` level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    /// | Field            | Default               |
    /// |------------------|-----------------------|
    /// | bind_addr        | `0.0.0.0:3000`        |
    /// | device_hint      | none                  |
    /// | preference       | `"Bus 2"`, `"IAC"`    |
    /// | poll_interval    | 2 seconds             |
    /// | midi_client_name | `"pageturn"`          |
    /// | log_level        | `"info"`              |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            device_hint: None,
            preference: DevicePreference::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            midi_client_name: DEFAULT_MIDI_CLIENT_NAME.to_string(),
            log_level: "info".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_3000() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr.port(), 3000);
    }

    #[test]
    fn test_default_binds_all_interfaces() {
        let cfg = ServerConfig::default();
        assert!(cfg.bind_addr.ip().is_unspecified());
    }

    #[test]
    fn test_default_has_no_device_hint() {
        assert!(ServerConfig::default().device_hint.is_none());
    }

    #[test]
    fn test_default_preference_tokens() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.preference.preferred_token, "Bus 2");
        assert_eq!(cfg.preference.fallback_token, "IAC");
    }

    #[test]
    fn test_default_poll_interval_is_2s() {
        assert_eq!(ServerConfig::default().poll_interval, Duration::from_secs(2));
    }
}
