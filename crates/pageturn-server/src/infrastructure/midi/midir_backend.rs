//! Hardware MIDI backend built on `midir`.
//!
//! `midir` invokes the input callback on a driver-owned thread.  The callback
//! only parses the bytes and pushes the program number into the
//! [`ProgramListener`] channel; all session logic stays on the hub task.
//!
//! A fresh `MidiInput` client is created for every call because `midir`
//! consumes the client when connecting, and because listing must reflect
//! hot-plugged devices.

use midir::{MidiInput, MidiInputConnection};
use tracing::{debug, warn};

use super::parse_program_change;
use crate::application::device_io::{DeviceError, InputHandle, MidiBackend, ProgramListener};

/// [`MidiBackend`] backed by the platform MIDI stack.
#[derive(Debug, Clone)]
pub struct MidirBackend {
    client_name: String,
}

impl MidirBackend {
    pub fn new(client_name: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
        }
    }

    fn client(&self) -> Result<MidiInput, DeviceError> {
        MidiInput::new(&self.client_name).map_err(|e| DeviceError::Backend(e.to_string()))
    }
}

impl MidiBackend for MidirBackend {
    fn list_inputs(&self) -> Vec<String> {
        let input = match self.client() {
            Ok(input) => input,
            Err(e) => {
                warn!("cannot enumerate MIDI inputs: {e}");
                return Vec::new();
            }
        };
        input
            .ports()
            .iter()
            .filter_map(|port| input.port_name(port).ok())
            .collect()
    }

    fn open_input(
        &self,
        name: &str,
        listener: ProgramListener,
    ) -> Result<Box<dyn InputHandle>, DeviceError> {
        let input = self.client()?;
        let port = input
            .ports()
            .into_iter()
            .find(|port| input.port_name(port).map_or(false, |n| n == name))
            .ok_or_else(|| DeviceError::NotFound {
                requested: name.to_string(),
            })?;

        let connection = input
            .connect(
                &port,
                &format!("{}-input", self.client_name),
                move |_stamp, bytes, _| {
                    if let Some(program) = parse_program_change(bytes) {
                        if !listener.emit(program) {
                            debug!("program change dropped: session task has stopped");
                        }
                    }
                },
                (),
            )
            .map_err(|e| DeviceError::OpenFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(MidirInputHandle { connection }))
    }
}

/// An open `midir` connection.
struct MidirInputHandle {
    connection: MidiInputConnection<()>,
}

impl InputHandle for MidirInputHandle {
    fn close(self: Box<Self>) -> Result<(), DeviceError> {
        // `close` hands back the client and user data; both are discarded.
        let _ = self.connection.close();
        Ok(())
    }
}
