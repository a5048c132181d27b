//! JSON codec for viewer events.
//!
//! Frames are validated here, at the boundary.  Anything that is not one of
//! the known events with a well-formed payload becomes a
//! [`ProtocolError::Malformed`], which callers log and drop.  Undefined or
//! partially-typed payloads never travel further into the system.

use serde::Serialize;
use thiserror::Error;

use crate::protocol::messages::{ClientMessage, ServerMessage};

/// Errors that can occur while encoding or decoding an event frame.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is not valid JSON, names an unknown event, or carries a
    /// payload of the wrong shape (for example `{"page":0}`).
    #[error("malformed event frame: {0}")]
    Malformed(String),

    /// The event could not be serialized.
    #[error("failed to serialize event: {0}")]
    Serialize(String),
}

/// Encodes any event as a JSON text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if serde rejects the value.  The event
/// types in this crate always serialize, so this only fires for foreign types.
pub fn encode_message<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

/// Decodes a viewer → server frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] for any frame that is not a known
/// viewer event.
pub fn decode_client_message(frame: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Decodes a server → viewer frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] for any frame that is not a known
/// server event.
///
/// # Examples
///
/// ```rust
/// use pageturn_core::{decode_server_message, ServerMessage};
///
/// let msg = decode_server_message(r#"{"event":"page_change","data":{"page":3}}"#).unwrap();
/// assert!(matches!(msg, ServerMessage::PageChange { page } if page.get() == 3));
/// ```
pub fn decode_server_message(frame: &str) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))
}
