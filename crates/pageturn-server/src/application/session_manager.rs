//! InputSessionManager: the single owner of the open MIDI input.
//!
//! # State machine
//!
//! ```text
//!            select_device(ok)              select_device(other, ok)
//!   Idle ───────────────────────►  Connected(name) ─────────────────┐
//!    ▲                                 │    ▲                        │
//!    │   open failed / unplugged       │    └────────────────────────┘
//!    └─────────────────────────────────┘
//! ```
//!
//! Invariants:
//!
//! - At most one [`InputHandle`] is open at any time.  Switching always closes
//!   the previous handle *before* opening the next one, even if closing
//!   reports an error.
//! - A handle is held if and only if the state is `Connected`.
//! - A request that matches no device leaves the state exactly as it was.
//! - Events are only translated for the handle that is currently open.  Each
//!   opened handle gets a new generation number, and events carrying an older
//!   generation are dropped.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

use pageturn_core::{
    page_for_program, resolve_device_name, select_initial_device, DevicePreference, DeviceStatus,
    PageNumber,
};

use crate::application::device_io::{DeviceError, DeviceEvent, InputHandle, ProgramListener};
use crate::application::device_registry::DeviceRegistry;

/// Public view of the manager's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No input is open.
    Idle,
    /// Listening to the named input.
    Connected(String),
}

struct ActiveInput {
    name: String,
    generation: u64,
    handle: Box<dyn InputHandle>,
}

/// Owns the session context: which input is active and its live handle.
pub struct InputSessionManager {
    registry: DeviceRegistry,
    active: Option<ActiveInput>,
    next_generation: u64,
    events: UnboundedSender<DeviceEvent>,
}

impl InputSessionManager {
    /// Creates an idle manager.  Events from inputs it opens are delivered
    /// to `events`.
    pub fn new(registry: DeviceRegistry, events: UnboundedSender<DeviceEvent>) -> Self {
        Self {
            registry,
            active: None,
            next_generation: 0,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.active {
            Some(active) => SessionState::Connected(active.name.clone()),
            None => SessionState::Idle,
        }
    }

    /// Canonical name of the connected input, if any.
    pub fn active_device(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    /// Re-queries the registry.
    pub fn list_devices(&self) -> Vec<String> {
        self.registry.list_devices()
    }

    /// Current snapshot for viewers.
    pub fn status(&self) -> DeviceStatus {
        DeviceStatus {
            available: self.list_devices(),
            connected: self.active_device().map(str::to_string),
        }
    }

    /// Applies the startup priority policy once and opens the chosen input.
    ///
    /// Returns the connected input name, or `None` if nothing was available
    /// or the chosen input failed to open.
    pub fn select_initial(
        &mut self,
        hint: Option<&str>,
        preference: &DevicePreference,
    ) -> Option<&str> {
        let available = self.list_devices();
        info!("available MIDI inputs: {available:?}");

        let Some(chosen) = select_initial_device(hint, &available, preference) else {
            warn!("no MIDI inputs found; make sure a MIDI driver or device is enabled");
            return None;
        };

        if let Err(e) = self.open(&chosen) {
            error!("error connecting to MIDI input: {e}");
            return None;
        }
        self.active_device()
    }

    /// Switches to the input matching `requested`.
    ///
    /// - Already connected to exactly `requested`: no-op success, the handle
    ///   is not reopened.
    /// - No match (exact, then case-insensitive substring): returns
    ///   [`DeviceError::NotFound`] and the state is unchanged.
    /// - Otherwise the current handle is closed first (a close error is
    ///   logged, not returned), then the resolved input is opened.  If that
    ///   fails the manager ends `Idle`.
    pub fn select_device(&mut self, requested: &str) -> Result<(), DeviceError> {
        if self.active_device() == Some(requested) {
            return Ok(());
        }

        let available = self.list_devices();
        let resolved = resolve_device_name(requested, &available)
            .map(str::to_string)
            .ok_or_else(|| DeviceError::NotFound {
                requested: requested.to_string(),
            })?;

        self.close_active();
        self.open(&resolved)
    }

    /// Translates a device event into the page to broadcast.
    ///
    /// Returns `None` while idle or for an event produced by a handle that
    /// has since been closed.  No debouncing: repeated programs each yield a
    /// page.
    pub fn on_device_event(&self, event: DeviceEvent) -> Option<PageNumber> {
        let active = self.active.as_ref()?;
        if active.generation != event.generation {
            return None;
        }
        let page = page_for_program(event.program);
        info!(
            "MIDI program change (raw: {}) -> jump to page {page}",
            event.program
        );
        Some(page)
    }

    /// Closes the active input if it is no longer in `available`.
    ///
    /// Returns `true` if the state changed to `Idle`.
    pub fn drop_if_missing(&mut self, available: &[String]) -> bool {
        let Some(name) = self.active_device() else {
            return false;
        };
        if available.iter().any(|d| d == name) {
            return false;
        }
        warn!("MIDI input \"{name}\" disappeared");
        self.close_active();
        true
    }

    /// Closes the active input, if any.  Used at shutdown.
    pub fn close(&mut self) {
        self.close_active();
    }

    fn close_active(&mut self) {
        if let Some(active) = self.active.take() {
            match active.handle.close() {
                Ok(()) => info!("closed MIDI input \"{}\"", active.name),
                Err(e) => warn!("{e}"),
            }
        }
    }

    fn open(&mut self, name: &str) -> Result<(), DeviceError> {
        debug_assert!(self.active.is_none(), "previous handle must be closed first");

        self.next_generation += 1;
        let generation = self.next_generation;
        let listener = ProgramListener::new(generation, self.events.clone());

        let handle = self.registry.backend().open_input(name, listener)?;
        info!("listening to MIDI input \"{name}\" (program change -> page number)");
        self.active = Some(ActiveInput {
            name: name.to_string(),
            generation,
            handle,
        });
        Ok(())
    }
}

impl Drop for InputSessionManager {
    fn drop(&mut self) {
        self.close_active();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
