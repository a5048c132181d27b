//! Abstraction over the MIDI device I/O library.
//!
//! The application layer never touches a MIDI driver directly.  It sees three
//! things:
//!
//! - [`MidiBackend`]: list input names, open one by name.
//! - [`InputHandle`]: an open input; closing it stops its events.
//! - [`ProgramListener`]: the callback target a backend feeds Program Change
//!   numbers into.  It forwards them over a channel to the task that owns the
//!   session, tagged with the generation of the handle that produced them.
//!
//! The production implementation uses `midir` (behind the `midir` feature);
//! tests use `infrastructure::midi::mock::MockMidiBackend`.

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Errors raised by MIDI device operations.
///
/// None of these are fatal to the process: the session manager recovers
/// locally and viewers only ever see the resulting status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// No available input matches the requested name, or the input vanished
    /// between listing and opening.
    #[error("no MIDI input matches \"{requested}\"")]
    NotFound { requested: String },

    /// The input is listed but the driver refused to open it.
    #[error("failed to open MIDI input \"{name}\": {reason}")]
    OpenFailed { name: String, reason: String },

    /// The driver reported an error while closing an input.
    #[error("failed to close MIDI input \"{name}\": {reason}")]
    CloseFailed { name: String, reason: String },

    /// The MIDI subsystem itself is unavailable.
    #[error("MIDI backend error: {0}")]
    Backend(String),
}

/// A Program Change received from an open input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEvent {
    /// Generation of the handle that produced the event.
    pub generation: u64,
    /// Zero-based program number as sent by the hardware.
    pub program: u8,
}

/// Callback target handed to [`MidiBackend::open_input`].
///
/// Cloneable and `Send` so a backend can move it into a driver thread.
#[derive(Debug, Clone)]
pub struct ProgramListener {
    generation: u64,
    tx: UnboundedSender<DeviceEvent>,
}

impl ProgramListener {
    pub fn new(generation: u64, tx: UnboundedSender<DeviceEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forwards one Program Change.  Returns `false` once the session task is
    /// gone and nobody is listening any more.
    pub fn emit(&self, program: u8) -> bool {
        self.tx
            .send(DeviceEvent {
                generation: self.generation,
                program,
            })
            .is_ok()
    }
}

/// An open MIDI input.
pub trait InputHandle: Send {
    /// Closes the input.  After this returns, no further events are emitted
    /// for it, whether or not closing reported an error.
    fn close(self: Box<Self>) -> Result<(), DeviceError>;
}

/// The device I/O library, as seen by the application layer.
pub trait MidiBackend: Send + Sync {
    /// Lists the currently available input names in driver order.
    ///
    /// Must query the environment on every call: inputs can be plugged or
    /// unplugged between calls.  A driver failure yields an empty list.
    fn list_inputs(&self) -> Vec<String>;

    /// Opens the input named exactly `name` and starts feeding its Program
    /// Change messages into `listener`.
    ///
    /// # Errors
    ///
    /// [`DeviceError::NotFound`] if the input is no longer present,
    /// [`DeviceError::OpenFailed`] if the driver refuses it.
    fn open_input(
        &self,
        name: &str,
        listener: ProgramListener,
    ) -> Result<Box<dyn InputHandle>, DeviceError>;
}
