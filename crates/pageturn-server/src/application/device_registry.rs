//! Device registry: the list of MIDI inputs the server could open.
//!
//! The registry is a pure query with no state of its own.  It never caches:
//! every call asks the backend again, because inputs come and go while the
//! server runs.

use std::sync::Arc;

use crate::application::device_io::MidiBackend;

/// Enumerates available MIDI inputs.
#[derive(Clone)]
pub struct DeviceRegistry {
    backend: Arc<dyn MidiBackend>,
}

impl DeviceRegistry {
    pub fn new(backend: Arc<dyn MidiBackend>) -> Self {
        Self { backend }
    }

    /// Returns the available input names in driver order.  May be empty.
    pub fn list_devices(&self) -> Vec<String> {
        self.backend.list_inputs()
    }

    /// The backend used to open inputs.  Only the session manager opens them.
    pub(crate) fn backend(&self) -> &dyn MidiBackend {
        self.backend.as_ref()
    }
}
