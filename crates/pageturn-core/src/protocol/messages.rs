//! Event types for the server ↔ viewer channel.
//!
//! Every WebSocket text frame carries exactly one event, encoded as a JSON
//! object with an `"event"` field naming it and a `"data"` field holding its
//! payload:
//!
//! ```json
//! {"event":"page_change","data":{"page":5}}
//! {"event":"set_midi_port","data":"IAC Driver Bus 1"}
//! {"event":"get_midi_ports"}
//! ```
//!
//! Serde's adjacently tagged representation (`tag = "event"`,
//! `content = "data"`) handles this automatically.
//!
//! # Why separate server→viewer and viewer→server types?
//!
//! The two directions carry different events.  Two distinct enums make it a
//! compile-time error to send a viewer-only event to a viewer, and vice versa,
//! and they give the decoder a closed set of names to accept.

use serde::{Deserialize, Serialize};

use crate::domain::device::DeviceStatus;
use crate::domain::page::PageNumber;

// ── Server → Viewer events ────────────────────────────────────────────────────

/// All events the server pushes to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Authoritative instruction: render this page.
    ///
    /// Broadcast to every viewer once per MIDI Program Change.
    PageChange {
        /// The page to show.  The server does not know the document length,
        /// so viewers must check the upper bound themselves.
        page: PageNumber,
    },

    /// Unicast reply to `get_midi_ports`.
    MidiPortsList {
        /// Input names in registry order.
        ports: Vec<String>,
        /// The connected input, or `null` when idle.
        active: Option<String>,
    },

    /// Device snapshot, broadcast after every switch attempt and sent to each
    /// viewer as soon as it connects.
    MidiStatus {
        /// Input names in registry order.
        #[serde(rename = "availablePorts")]
        available_ports: Vec<String>,
        /// The connected input, or `null` when idle.
        #[serde(rename = "connectedPort")]
        connected_port: Option<String>,
    },
}

impl ServerMessage {
    /// Builds a `midi_status` event from a device snapshot.
    pub fn status(status: &DeviceStatus) -> Self {
        Self::MidiStatus {
            available_ports: status.available.clone(),
            connected_port: status.connected.clone(),
        }
    }

    /// Builds a `midi_ports_list` reply from a device snapshot.
    pub fn ports_list(status: &DeviceStatus) -> Self {
        Self::MidiPortsList {
            ports: status.available.clone(),
            active: status.connected.clone(),
        }
    }

    /// The wire name of this event, for log lines.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::PageChange { .. } => "page_change",
            Self::MidiPortsList { .. } => "midi_ports_list",
            Self::MidiStatus { .. } => "midi_status",
        }
    }
}

// ── Viewer → Server events ────────────────────────────────────────────────────

/// All events a viewer can send to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the current device snapshot (answered to the requester only).
    GetMidiPorts,

    /// Ask the server to switch MIDI input.  The payload is the requested
    /// name; it is matched exactly first, then as a case-insensitive substring.
    SetMidiPort(String),
}

impl ClientMessage {
    /// The wire name of this event, for log lines.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::GetMidiPorts => "get_midi_ports",
            Self::SetMidiPort(_) => "set_midi_port",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_change_serializes_with_event_and_data() {
        // Arrange
        let msg = ServerMessage::PageChange {
            page: PageNumber::new(5).unwrap(),
        };

        // Act
        let json = serde_json::to_string(&msg).unwrap();

        // Assert
        assert_eq!(json, r#"{"event":"page_change","data":{"page":5}}"#);
    }

    #[test]
    fn test_midi_status_uses_camel_case_field_names() {
        let msg = ServerMessage::status(&DeviceStatus {
            available: vec!["IAC Driver Bus 1".to_string()],
            connected: None,
        });

        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "midi_status");
        assert_eq!(json["data"]["availablePorts"][0], "IAC Driver Bus 1");
        assert!(json["data"]["connectedPort"].is_null());
    }

    #[test]
    fn test_midi_ports_list_carries_active_port() {
        let msg = ServerMessage::ports_list(&DeviceStatus {
            available: vec!["A".to_string(), "B".to_string()],
            connected: Some("B".to_string()),
        });

        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["event"], "midi_ports_list");
        assert_eq!(json["data"]["ports"], serde_json::json!(["A", "B"]));
        assert_eq!(json["data"]["active"], "B");
    }

    #[test]
    fn test_get_midi_ports_has_no_data_field() {
        let json = serde_json::to_string(&ClientMessage::GetMidiPorts).unwrap();
        assert_eq!(json, r#"{"event":"get_midi_ports"}"#);
    }

    #[test]
    fn test_set_midi_port_data_is_plain_string() {
        let json = serde_json::to_string(&ClientMessage::SetMidiPort("USB".to_string())).unwrap();
        assert_eq!(json, r#"{"event":"set_midi_port","data":"USB"}"#);
    }

    #[test]
    fn test_event_names_match_wire_tags() {
        let msg = ServerMessage::PageChange {
            page: PageNumber::FIRST,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], msg.event_name());

        let msg = ClientMessage::SetMidiPort("x".to_string());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], msg.event_name());
    }
}
