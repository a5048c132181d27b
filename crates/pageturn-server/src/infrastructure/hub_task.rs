//! The hub task: sole owner of the session context.
//!
//! The open MIDI handle and the viewer set must never be touched from two
//! places at once.  Rather than guarding them with locks, one Tokio task owns
//! both ([`InputSessionManager`] and [`BroadcastHub`]) and everything else
//! talks to it through channels:
//!
//! ```text
//! WebSocket sessions ──HubCommand──┐
//! MIDI driver thread ──DeviceEvent─┼──► hub task ──ServerMessage──► viewer outboxes
//! poll timer ──────────tick────────┘
//! ```
//!
//! Each message is handled to completion before the next is received, so the
//! task behaves like a single-threaded event loop.

use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use pageturn_core::{ClientMessage, DeviceStatus, ServerMessage};

use crate::application::{BroadcastHub, DeviceEvent, InputSessionManager, ViewerId};

/// Requests sent to the hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// A viewer finished its WebSocket handshake.
    Connect {
        viewer: ViewerId,
        outbox: UnboundedSender<ServerMessage>,
    },
    /// A viewer's socket closed.
    Disconnect { viewer: ViewerId },
    /// A decoded event from a viewer.
    Inbound { viewer: ViewerId, msg: ClientMessage },
    /// Stop the task and close the MIDI input.
    Shutdown,
}

/// Cloneable handle used by WebSocket sessions to reach the hub task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Returns `false` if the hub task has stopped.
    pub fn connect(&self, viewer: ViewerId, outbox: UnboundedSender<ServerMessage>) -> bool {
        self.tx.send(HubCommand::Connect { viewer, outbox }).is_ok()
    }

    pub fn disconnect(&self, viewer: ViewerId) {
        let _ = self.tx.send(HubCommand::Disconnect { viewer });
    }

    /// Returns `false` if the hub task has stopped.
    pub fn forward(&self, viewer: ViewerId, msg: ClientMessage) -> bool {
        self.tx.send(HubCommand::Inbound { viewer, msg }).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(HubCommand::Shutdown);
    }
}

/// Spawns the hub task.
///
/// `device_events` must be the receiving end of the channel `session` was
/// created with.  The registry is re-queried every `poll_interval` to detect
/// hot-plugged inputs.
pub fn spawn_hub(
    session: InputSessionManager,
    device_events: UnboundedReceiver<DeviceEvent>,
    poll_interval: Duration,
) -> (HubHandle, JoinHandle<()>) {
    let (tx, commands) = unbounded_channel();
    let known_devices = session.list_devices();
    let task = HubTask {
        session,
        hub: BroadcastHub::new(),
        commands,
        device_events,
        poll_interval,
        known_devices,
    };
    (HubHandle { tx }, tokio::spawn(task.run()))
}

struct HubTask {
    session: InputSessionManager,
    hub: BroadcastHub,
    commands: UnboundedReceiver<HubCommand>,
    device_events: UnboundedReceiver<DeviceEvent>,
    poll_interval: Duration,
    known_devices: Vec<String>,
}

impl HubTask {
    async fn run(mut self) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick resolves immediately; the registry was just listed.
        ticker.tick().await;

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(HubCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(event) = self.device_events.recv() => {
                    if let Some(page) = self.session.on_device_event(event) {
                        self.hub.on_page_change(page);
                    } else {
                        debug!("dropped program change from inactive input");
                    }
                }
                _ = ticker.tick() => self.poll_registry(),
            }
        }

        self.session.close();
        info!("hub task stopped");
    }

    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect { viewer, outbox } => {
                self.hub.on_viewer_connect(viewer, outbox, &self.session)
            }
            HubCommand::Disconnect { viewer } => self.hub.on_viewer_disconnect(viewer),
            HubCommand::Inbound { viewer, msg } => {
                // A switch broadcast already told viewers about the current list.
                if let Some(status) =
                    self.hub
                        .handle_client_message(viewer, msg, &mut self.session)
                {
                    self.known_devices = status.available;
                }
            }
            HubCommand::Shutdown => {}
        }
    }

    /// Hot-plug detection: closes a vanished input and tells every viewer when
    /// the device list or connection changed.
    fn poll_registry(&mut self) {
        let available = self.session.list_devices();
        let lost_active = self.session.drop_if_missing(&available);
        if lost_active || available != self.known_devices {
            info!("MIDI inputs changed: {available:?}");
            let status = DeviceStatus {
                available: available.clone(),
                connected: self.session.active_device().map(str::to_string),
            };
            self.known_devices = available;
            self.hub.broadcast_status(&status);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use pageturn_core::DevicePreference;

    use super::*;
    use crate::application::DeviceRegistry;
    use crate::infrastructure::midi::mock::MockMidiBackend;

    fn task(backend: &MockMidiBackend) -> HubTask {
        let registry = DeviceRegistry::new(Arc::new(backend.clone()));
        let (events_tx, device_events) = unbounded_channel();
        let mut session = InputSessionManager::new(registry, events_tx);
        session.select_initial(None, &DevicePreference::default());
        let (_tx, commands) = unbounded_channel();
        let known_devices = session.list_devices();
        HubTask {
            session,
            hub: BroadcastHub::new(),
            commands,
            device_events,
            poll_interval: Duration::from_secs(60),
            known_devices,
        }
    }

    fn connect(task: &mut HubTask) -> UnboundedReceiver<ServerMessage> {
        let (outbox, mut rx) = unbounded_channel();
        task.handle_command(HubCommand::Connect {
            viewer: Uuid::new_v4(),
            outbox,
        });
        // Connect snapshot.
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::MidiStatus { .. })));
        rx
    }

    fn status(available: &[&str], connected: Option<&str>) -> ServerMessage {
        ServerMessage::MidiStatus {
            available_ports: available.iter().map(|s| s.to_string()).collect(),
            connected_port: connected.map(str::to_string),
        }
    }

    #[test]
    fn test_poll_announces_plugged_device() {
        // Arrange
        let backend = MockMidiBackend::with_devices(&["Pedal"]);
        let mut task = task(&backend);
        let mut rx = connect(&mut task);

        // Act
        backend.plug("Keys");
        task.poll_registry();

        // Assert
        assert_eq!(rx.try_recv().ok(), Some(status(&["Pedal", "Keys"], Some("Pedal"))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_poll_after_switch_does_not_repeat_status() {
        // Arrange: a new input appears between polls
        let backend = MockMidiBackend::with_devices(&["Pedal"]);
        let mut task = task(&backend);
        let mut rx = connect(&mut task);
        backend.plug("Keys");

        // Act: the switch broadcast already carries the new list
        task.handle_command(HubCommand::Inbound {
            viewer: Uuid::new_v4(),
            msg: ClientMessage::SetMidiPort("Keys".to_string()),
        });
        task.poll_registry();

        // Assert
        assert_eq!(rx.try_recv().ok(), Some(status(&["Pedal", "Keys"], Some("Keys"))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_list_request_leaves_poll_detection_intact() {
        let backend = MockMidiBackend::with_devices(&["Pedal"]);
        let mut task = task(&backend);
        let viewer = Uuid::new_v4();
        let (outbox, mut rx) = unbounded_channel();
        task.handle_command(HubCommand::Connect { viewer, outbox });
        let _ = rx.try_recv();
        backend.plug("Keys");

        task.handle_command(HubCommand::Inbound {
            viewer,
            msg: ClientMessage::GetMidiPorts,
        });
        task.poll_registry();

        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMessage::MidiPortsList { .. })
        ));
        assert_eq!(rx.try_recv().ok(), Some(status(&["Pedal", "Keys"], Some("Pedal"))));
    }
}
