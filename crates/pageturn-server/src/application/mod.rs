//! Application layer for pageturn-server.
//!
//! The application layer orchestrates the business logic: it knows *what* to
//! do, but delegates *how* to do it to the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Listing MIDI inputs (`device_registry`)
//! - Owning the single open input and translating its Program Changes into
//!   pages (`session_manager`)
//! - Tracking connected viewers and fanning events out to them
//!   (`broadcast_hub`)
//! - Defining the MIDI I/O abstraction the above depend on (`device_io`)
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (that is infrastructure)
//! - Tokio task spawning (that happens in the infrastructure layer)
//! - Talking to a MIDI driver directly

pub mod broadcast_hub;
pub mod device_io;
pub mod device_registry;
pub mod session_manager;

pub use broadcast_hub::{BroadcastHub, ViewerId};
pub use device_io::{DeviceError, DeviceEvent, InputHandle, MidiBackend, ProgramListener};
pub use device_registry::DeviceRegistry;
pub use session_manager::{InputSessionManager, SessionState};
