//! Integration tests for pageturn-core.
//!
//! These follow a value through the public API the way the server and the
//! viewer use it: a MIDI program becomes a page, the page becomes a JSON frame,
//! and the viewer decodes the frame back.

use pageturn_core::{
    decode_client_message, decode_server_message, encode_message, page_for_program,
    resolve_device_name, select_initial_device, ClientMessage, DevicePreference, DeviceStatus,
    PageNumber, ServerMessage,
};

#[test]
fn test_every_program_reaches_the_viewer_as_program_plus_one() {
    for program in 0..=127u8 {
        // Arrange
        let page = page_for_program(program);

        // Act
        let frame = encode_message(&ServerMessage::PageChange { page }).unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        let decoded = decode_server_message(&frame).unwrap();

        // Assert
        assert_eq!(json["event"], "page_change");
        assert_eq!(json["data"]["page"], u64::from(program) + 1);
        assert_eq!(decoded, ServerMessage::PageChange { page });
    }
}

#[test]
fn test_initial_selection_prefers_iac_over_first_device() {
    // Arrange: no hint and no "Bus 2", so the "IAC" fallback wins
    let available = vec!["USB MIDI".to_string(), "IAC Driver Bus 1".to_string()];

    // Act
    let chosen = select_initial_device(None, &available, &DevicePreference::default());

    // Assert
    assert_eq!(chosen.as_deref(), Some("IAC Driver Bus 1"));
}

#[test]
fn test_switch_request_from_the_wire_resolves_against_device_list() {
    let available = vec!["IAC Driver Bus 1".to_string(), "USB MIDI".to_string()];

    let msg = decode_client_message(r#"{"event":"set_midi_port","data":"usb"}"#).unwrap();
    let ClientMessage::SetMidiPort(requested) = msg else {
        panic!("expected set_midi_port");
    };

    assert_eq!(resolve_device_name(&requested, &available), Some("USB MIDI"));
}

#[test]
fn test_status_snapshot_frames_share_one_device_view() {
    // Arrange
    let status = DeviceStatus {
        available: vec!["A".to_string(), "B".to_string()],
        connected: Some("B".to_string()),
    };

    // Act
    let broadcast: serde_json::Value =
        serde_json::from_str(&encode_message(&ServerMessage::status(&status)).unwrap()).unwrap();
    let reply: serde_json::Value =
        serde_json::from_str(&encode_message(&ServerMessage::ports_list(&status)).unwrap())
            .unwrap();

    // Assert
    assert_eq!(
        broadcast,
        serde_json::json!({
            "event": "midi_status",
            "data": { "availablePorts": ["A", "B"], "connectedPort": "B" }
        })
    );
    assert_eq!(
        reply,
        serde_json::json!({
            "event": "midi_ports_list",
            "data": { "ports": ["A", "B"], "active": "B" }
        })
    );
}

#[test]
fn test_viewer_can_bound_check_decoded_pages() {
    let frame = r#"{"event":"page_change","data":{"page":12}}"#;
    let ServerMessage::PageChange { page } = decode_server_message(frame).unwrap() else {
        panic!("expected page_change");
    };

    assert!(!page.is_within(10));
    assert!(page.is_within(12));
    assert_eq!(page, PageNumber::new(12).unwrap());
}
