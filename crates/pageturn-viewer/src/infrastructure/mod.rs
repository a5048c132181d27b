//! Infrastructure layer for pageturn-viewer.
//!
//! - `runtime`: the single-task event loop that awaits loads and renders
//! - `connection`: the WebSocket link to the server, with reconnects

pub mod connection;
pub mod runtime;

pub use connection::{spawn_connection, ConnectionConfig};
pub use runtime::{ViewerEvent, ViewerRuntime, ViewerSnapshot};
