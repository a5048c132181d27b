//! PageTurn server — entry point.
//!
//! This binary listens to a MIDI foot controller and relays each Program
//! Change to every connected score viewer as a `page_change` event over
//! WebSocket.  Viewers can also list the MIDI inputs and switch between them.
//!
//! # Usage
//!
//! ```text
//! pageturn-server [OPTIONS] [DEVICE_HINT]
//!
//! Arguments:
//!   [DEVICE_HINT]        Part of the MIDI input name to prefer at startup
//!
//! Options:
//!   --port   <PORT>      WebSocket listener port [default: 3000]
//!   --bind   <ADDR>      IP address to bind to [default: 0.0.0.0]
//!   --config <FILE>      Optional TOML settings file
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence over environment variables, which take precedence
//! over the settings file.
//!
//! | Variable          | Description                 |
//! |-------------------|-----------------------------|
//! | `PAGETURN_PORT`   | WebSocket listener port     |
//! | `PAGETURN_BIND`   | Bind IP address             |
//! | `PAGETURN_CONFIG` | Path to the settings file   |
//! | `RUST_LOG`        | `tracing` filter directives |
//!
//! # Architecture overview
//!
//! ```text
//! MIDI foot controller (Program Change)
//!       ↓
//! pageturn-server  ← this process
//!   application/    registry, input session, broadcast hub
//!   infrastructure/
//!     midi/         midir backend
//!     hub_task/     owns the session context
//!     ws_server/    accepts viewer WebSockets
//!       ↓
//! Viewers  (JSON events over WebSocket, port 3000)
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pageturn_server::application::{DeviceRegistry, InputSessionManager, MidiBackend};
use pageturn_server::domain::ServerConfig;
use pageturn_server::infrastructure::{run_server, spawn_hub, FileConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// PageTurn server.
///
/// Relays MIDI Program Changes from a foot controller to connected score
/// viewers as page turns.
#[derive(Debug, Parser)]
#[command(
    name = "pageturn-server",
    about = "Relays MIDI foot-controller page turns to score viewers over WebSocket",
    version
)]
struct Cli {
    /// Part of the MIDI input name to connect to at startup.
    ///
    /// Matched case-insensitively.  When no input matches, the usual
    /// fallbacks apply ("Bus 2", then "IAC", then the first input).
    #[arg(value_name = "DEVICE_HINT")]
    device_hint: Option<String>,

    /// TCP port for the WebSocket server.
    #[arg(long, env = "PAGETURN_PORT")]
    port: Option<u16>,

    /// IP address to bind the WebSocket server to.
    ///
    /// Use `0.0.0.0` so tablets on the LAN can connect, or `127.0.0.1` to
    /// accept only local viewers.
    #[arg(long, env = "PAGETURN_BIND")]
    bind: Option<String>,

    /// Optional TOML settings file.
    #[arg(long, env = "PAGETURN_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges the settings file (if any) with the CLI/env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed, or if
    /// a bind address is not a valid IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => FileConfig::default(),
        };
        let mut config = file.into_server_config()?;

        if let Some(bind) = &self.bind {
            let ip: IpAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address: '{bind}'"))?;
            config.bind_addr = SocketAddr::new(ip, config.bind_addr.port());
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        config.device_hint = self.device_hint;

        Ok(config)
    }
}

/// Chooses the MIDI driver compiled into this binary.
#[cfg(feature = "midir")]
fn midi_backend(config: &ServerConfig) -> Arc<dyn MidiBackend> {
    Arc::new(pageturn_server::infrastructure::midi::MidirBackend::new(
        &config.midi_client_name,
    ))
}

#[cfg(not(feature = "midir"))]
fn midi_backend(_config: &ServerConfig) -> Arc<dyn MidiBackend> {
    warn!("built without the `midir` feature; no MIDI inputs will be available");
    Arc::new(pageturn_server::infrastructure::midi::UnavailableBackend)
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments (and their environment variables) are parsed and merged
///    with the optional settings file into a [`ServerConfig`].
/// 2. `tracing_subscriber` is initialised.  `RUST_LOG` wins; otherwise the
///    configured `log_level` applies.
/// 3. The startup device policy picks and opens one MIDI input.
/// 4. The hub task is spawned; it owns the session from here on.
/// 5. A Ctrl+C handler clears a shared `AtomicBool`.
/// 6. [`run_server`] accepts viewers until the flag is cleared, then the hub
///    task is stopped, which closes the MIDI input.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.into_server_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("PageTurn server starting on {}", config.bind_addr);

    // ── MIDI input ────────────────────────────────────────────────────────────
    let registry = DeviceRegistry::new(midi_backend(&config));
    let (events_tx, events_rx) = unbounded_channel();
    let mut session = InputSessionManager::new(registry, events_tx);
    if let Some(name) = session.select_initial(config.device_hint.as_deref(), &config.preference)
    {
        info!("connected to MIDI input: {name}");
    }

    let (hub, hub_task) = spawn_hub(session, events_rx, config.poll_interval);

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Main server loop ──────────────────────────────────────────────────────
    let served = run_server(config.bind_addr, hub.clone(), running).await;

    hub.shutdown();
    if let Err(e) = hub_task.await {
        warn!("hub task ended abnormally: {e}");
    }

    served?;
    info!("PageTurn server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
