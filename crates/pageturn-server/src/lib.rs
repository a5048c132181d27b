//! pageturn-server library crate.
//!
//! This crate listens to a MIDI foot controller and relays its page turns to
//! every connected score viewer over WebSocket.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! MIDI input (Program Change)
//!         ↓
//! [pageturn-server]
//!   ├── domain/           Pure types: ServerConfig
//!   ├── application/      Device registry, input session manager,
//!   │                     broadcast hub, device I/O abstraction
//!   └── infrastructure/
//!         ├── midi/       MIDI backends (midir, mock) + byte parsing
//!         ├── hub_task/   Task that owns the session context
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         └── config_file/ TOML settings file
//!         ↓
//! Viewers (JSON events over WebSocket)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `pageturn-core`; it talks to MIDI
//!   hardware only through the [`application::device_io::MidiBackend`] trait.
//! - `infrastructure` depends on all other layers plus `tokio`, `tungstenite`
//!   and the MIDI driver crate.
//!
//! # Concurrency model
//!
//! All session state (the open MIDI handle, the viewer set) is owned by one
//! task.  WebSocket sessions and the MIDI driver thread talk to it through
//! channels, so every state transition runs to completion before the next
//! one starts, exactly like a single-threaded event loop.

/// Domain layer: pure configuration types (no I/O).
pub mod domain;

/// Application layer: device selection and event fan-out.
pub mod application;

/// Infrastructure layer: MIDI backends, hub task and WebSocket server.
pub mod infrastructure;
