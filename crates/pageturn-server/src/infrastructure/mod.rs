//! Infrastructure layer for pageturn-server.
//!
//! The infrastructure layer handles all I/O: talking to the MIDI driver,
//! accepting WebSocket connections from viewers and reading the settings file.
//!
//! # Responsibilities
//!
//! - Implementing [`crate::application::MidiBackend`] on top of `midir`, plus
//!   a mock for tests (`midi`)
//! - Running the task that owns the input session and the viewer set
//!   (`hub_task`)
//! - Binding the TCP listener and performing the WebSocket upgrade
//!   (`ws_server`)
//! - Parsing the optional TOML settings file (`config_file`)
//!
//! # What does NOT belong here?
//!
//! - Device selection policy (that is `pageturn-core` and the application layer)
//! - Event type definitions (that is `pageturn-core::protocol`)

pub mod config_file;
pub mod hub_task;
pub mod midi;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use config_file::{ConfigError, FileConfig};
pub use hub_task::{spawn_hub, HubHandle};
pub use ws_server::{run_server, serve};
