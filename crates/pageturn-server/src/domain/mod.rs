//! Domain layer for pageturn-server.
//!
//! The domain layer contains pure types that have no dependencies on I/O,
//! networking, or external frameworks.
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, `WebSocket` or MIDI driver types
//! - File I/O or environment variable reading
//! - Anything that could block or fail due to external state

pub mod config;

pub use config::ServerConfig;
