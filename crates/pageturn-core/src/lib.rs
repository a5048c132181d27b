//! # pageturn-core
//!
//! Shared library for PageTurn containing the viewer event protocol, the page
//! numbering rules, and the MIDI input selection policy.
//!
//! This crate is used by both the server and the viewer.  It has zero
//! dependencies on OS APIs, MIDI drivers, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! PageTurn mirrors a performer's page turns onto one or more score viewers
//! (for example a tablet on a music stand).  A MIDI foot controller sends a
//! *Program Change* message; the server turns it into a page number and
//! pushes that page to every connected viewer, which then redraws its score.
//!
//! This crate (`pageturn-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – The JSON events exchanged between server and viewers
//!   (`page_change`, `midi_status`, ...), as closed Rust enums so malformed
//!   payloads are rejected at the boundary.
//!
//! - **`domain`** – Pure rules with no I/O: the 1-based [`PageNumber`], the
//!   program-to-page offset, and how a requested device name is matched
//!   against the list of available MIDI inputs.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `pageturn_core::PageNumber` instead of `pageturn_core::domain::page::PageNumber`.
pub use domain::device::{
    resolve_device_name, select_initial_device, DevicePreference, DeviceStatus,
};
pub use domain::page::{page_for_program, PageNumber};
pub use protocol::codec::{decode_client_message, decode_server_message, encode_message, ProtocolError};
pub use protocol::messages::{ClientMessage, ServerMessage};
