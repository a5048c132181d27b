//! MIDI input infrastructure.
//!
//! Implementations of [`MidiBackend`] plus the raw byte parsing shared by
//! them.
//!
//! # Backends
//!
//! | Backend                  | When                                          |
//! |--------------------------|-----------------------------------------------|
//! | `MidirBackend`           | `midir` feature enabled (real hardware)       |
//! | [`UnavailableBackend`]   | built without `midir`; lists no inputs        |
//! | [`mock::MockMidiBackend`]| tests                                         |
//!
//! # What is a Program Change? (for beginners)
//!
//! MIDI messages start with a *status byte* whose high nibble is the message
//! kind and whose low nibble is the channel (0–15).  A Program Change is
//! `0xCn` followed by one data byte, the program number `0..=127`.  Foot
//! controllers send one per pedal press.

use crate::application::device_io::{DeviceError, InputHandle, MidiBackend, ProgramListener};

pub mod mock;

#[cfg(feature = "midir")]
pub mod midir_backend;

#[cfg(feature = "midir")]
pub use midir_backend::MidirBackend;

const PROGRAM_CHANGE: u8 = 0xC0;

/// Extracts the program number from a raw Program Change message.
///
/// Any channel is accepted.  Every other message kind, a truncated message,
/// or a data byte with the high bit set returns `None`.
pub fn parse_program_change(bytes: &[u8]) -> Option<u8> {
    match bytes {
        [status, program, ..] if status & 0xF0 == PROGRAM_CHANGE && program & 0x80 == 0 => {
            Some(*program)
        }
        _ => None,
    }
}

/// Stand-in backend for builds without hardware MIDI support.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl MidiBackend for UnavailableBackend {
    fn list_inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn open_input(
        &self,
        name: &str,
        _listener: ProgramListener,
    ) -> Result<Box<dyn InputHandle>, DeviceError> {
        Err(DeviceError::Backend(format!(
            "cannot open \"{name}\": built without MIDI support (enable the `midir` feature)"
        )))
    }
}
