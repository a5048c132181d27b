//! Mock MIDI backend for testing.
//!
//! Allows tests to script the device list, make individual inputs fail to
//! open or close, inject Program Change messages, and inspect the exact order
//! of open/close calls, without any MIDI hardware or driver.
//!
//! The mock is cheaply cloneable; all clones share the same state, so a test
//! keeps one clone for scripting and hands another to the code under test.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::device_io::{DeviceError, InputHandle, MidiBackend, ProgramListener};

/// One recorded call against the mock, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Open(String),
    Close(String),
}

#[derive(Default)]
struct MockState {
    devices: Vec<String>,
    fail_open: HashSet<String>,
    fail_close: HashSet<String>,
    vanish_on_open: HashSet<String>,
    open: HashMap<u64, (String, ProgramListener)>,
    next_handle: u64,
    max_open: usize,
    calls: Vec<MockCall>,
}

/// A scriptable [`MidiBackend`].
#[derive(Clone, Default)]
pub struct MockMidiBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockMidiBackend {
    /// Creates a backend with no inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend listing `names` in order.
    pub fn with_devices(names: &[&str]) -> Self {
        let backend = Self::new();
        for name in names {
            backend.plug(name);
        }
        backend
    }

    /// Adds an input to the end of the list.
    pub fn plug(&self, name: &str) {
        self.lock().devices.push(name.to_string());
    }

    /// Removes an input from the list.  Any open handle for it stays open
    /// until the session manager notices and closes it.
    pub fn unplug(&self, name: &str) {
        self.lock().devices.retain(|d| d != name);
    }

    /// Makes every subsequent open of `name` fail with `OpenFailed`.
    pub fn fail_open(&self, name: &str) {
        self.lock().fail_open.insert(name.to_string());
    }

    /// Makes every subsequent close of `name` report `CloseFailed`.
    pub fn fail_close(&self, name: &str) {
        self.lock().fail_close.insert(name.to_string());
    }

    /// Simulates `name` disappearing after it was listed but before the open
    /// call reaches the driver.
    pub fn vanish_on_open(&self, name: &str) {
        self.lock().vanish_on_open.insert(name.to_string());
    }

    /// Delivers a Program Change from `device` to every open handle on it.
    /// Returns `false` if no handle for `device` is open.
    pub fn send_program(&self, device: &str, program: u8) -> bool {
        let state = self.lock();
        let mut delivered = false;
        for (name, listener) in state.open.values() {
            if name == device {
                delivered |= listener.emit(program);
            }
        }
        delivered
    }

    /// Number of handles currently open.
    pub fn open_count(&self) -> usize {
        self.lock().open.len()
    }

    /// Highest number of handles that were ever open at the same time.
    pub fn max_concurrent_open(&self) -> usize {
        self.lock().max_open
    }

    /// Every open/close call so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MidiBackend for MockMidiBackend {
    fn list_inputs(&self) -> Vec<String> {
        self.lock().devices.clone()
    }

    fn open_input(
        &self,
        name: &str,
        listener: ProgramListener,
    ) -> Result<Box<dyn InputHandle>, DeviceError> {
        let mut state = self.lock();
        state.calls.push(MockCall::Open(name.to_string()));

        if state.vanish_on_open.remove(name) {
            state.devices.retain(|d| d != name);
        }
        if !state.devices.iter().any(|d| d == name) {
            return Err(DeviceError::NotFound {
                requested: name.to_string(),
            });
        }
        if state.fail_open.contains(name) {
            return Err(DeviceError::OpenFailed {
                name: name.to_string(),
                reason: "mock open failure".to_string(),
            });
        }

        let id = state.next_handle;
        state.next_handle += 1;
        state.open.insert(id, (name.to_string(), listener));
        state.max_open = state.max_open.max(state.open.len());

        Ok(Box::new(MockInputHandle {
            id,
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Handle returned by [`MockMidiBackend::open_input`].
struct MockInputHandle {
    id: u64,
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl InputHandle for MockInputHandle {
    fn close(self: Box<Self>) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.calls.push(MockCall::Close(self.name.clone()));
        // The listener is released even when closing "fails", matching a real
        // driver that tears the port down regardless.
        state.open.remove(&self.id);
        if state.fail_close.contains(&self.name) {
            return Err(DeviceError::CloseFailed {
                name: self.name.clone(),
                reason: "mock close failure".to_string(),
            });
        }
        Ok(())
    }
}
