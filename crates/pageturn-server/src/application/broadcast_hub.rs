//! BroadcastHub: the set of connected viewers and the fan-out of events.
//!
//! Each viewer is represented by the sending half of its outbound queue.  The
//! WebSocket layer drains the other half into the socket, so sending here
//! never waits on the network.
//!
//! Device state is global, so the hub answers viewer requests using the
//! [`InputSessionManager`] passed in by the owner of the session context.
//! The hub never holds the manager itself.

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pageturn_core::{ClientMessage, DeviceStatus, PageNumber, ServerMessage};

use crate::application::session_manager::InputSessionManager;

/// Identifies one connected viewer (one browser tab).
pub type ViewerId = Uuid;

/// Connected viewers and their outbound queues.
#[derive(Default)]
pub struct BroadcastHub {
    viewers: HashMap<ViewerId, UnboundedSender<ServerMessage>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Registers a viewer and sends it exactly one `midi_status` snapshot.
    ///
    /// No page is replayed: a fresh viewer shows its own first page until the
    /// next `page_change` arrives.
    pub fn on_viewer_connect(
        &mut self,
        viewer: ViewerId,
        outbox: UnboundedSender<ServerMessage>,
        session: &InputSessionManager,
    ) {
        info!("viewer connected: {viewer}");
        self.viewers.insert(viewer, outbox);
        self.send_to(viewer, ServerMessage::status(&session.status()));
    }

    pub fn on_viewer_disconnect(&mut self, viewer: ViewerId) {
        if self.viewers.remove(&viewer).is_some() {
            info!("viewer disconnected: {viewer}");
        }
    }

    /// Broadcasts `page_change` to every viewer.
    pub fn on_page_change(&self, page: PageNumber) {
        self.broadcast(&ServerMessage::PageChange { page });
    }

    /// Attempts a device switch, then broadcasts the resulting status to
    /// every viewer regardless of the outcome.
    ///
    /// Returns the broadcast snapshot.
    pub fn on_switch_device_request(
        &self,
        viewer: ViewerId,
        requested: &str,
        session: &mut InputSessionManager,
    ) -> DeviceStatus {
        info!("viewer {viewer} requested MIDI input \"{requested}\"");
        if let Err(e) = session.select_device(requested) {
            warn!("MIDI input switch failed: {e}");
        }
        let status = session.status();
        self.broadcast_status(&status);
        status
    }

    /// Replies to `viewer` only with the current snapshot.
    pub fn on_list_devices_request(&self, viewer: ViewerId, session: &InputSessionManager) {
        self.send_to(viewer, ServerMessage::ports_list(&session.status()));
    }

    /// Dispatches a decoded viewer event.
    ///
    /// Returns the status snapshot if one was broadcast.
    pub fn handle_client_message(
        &self,
        viewer: ViewerId,
        msg: ClientMessage,
        session: &mut InputSessionManager,
    ) -> Option<DeviceStatus> {
        debug!("viewer {viewer} → server: {}", msg.event_name());
        match msg {
            ClientMessage::GetMidiPorts => {
                self.on_list_devices_request(viewer, session);
                None
            }
            ClientMessage::SetMidiPort(requested) => {
                Some(self.on_switch_device_request(viewer, &requested, session))
            }
        }
    }

    /// Pushes a `midi_status` snapshot to every viewer.
    pub fn broadcast_status(&self, status: &DeviceStatus) {
        self.broadcast(&ServerMessage::status(status));
    }

    fn broadcast(&self, msg: &ServerMessage) {
        debug!(
            "broadcasting {} to {} viewer(s)",
            msg.event_name(),
            self.viewers.len()
        );
        for (viewer, outbox) in &self.viewers {
            if outbox.send(msg.clone()).is_err() {
                // The socket task is already gone; its disconnect is queued.
                debug!("viewer {viewer}: outbound queue closed");
            }
        }
    }

    fn send_to(&self, viewer: ViewerId, msg: ServerMessage) {
        match self.viewers.get(&viewer) {
            Some(outbox) => {
                if outbox.send(msg).is_err() {
                    debug!("viewer {viewer}: outbound queue closed");
                }
            }
            None => debug!("viewer {viewer}: not connected; dropping {}", msg.event_name()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
