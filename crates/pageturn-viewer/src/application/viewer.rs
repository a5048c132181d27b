//! Viewer: the state of one score display.
//!
//! The viewer reacts to server events, local taps and document loads, and
//! tells its caller what to do next as a [`ViewerAction`].  It never performs
//! I/O itself, so every transition can be tested synchronously; the async
//! runtime in `infrastructure::runtime` carries out the actions and reports
//! their completion back.
//!
//! # Page bounds
//!
//! The server knows nothing about the loaded document and may ask for any
//! page.  Requests outside `1..=page_count` are logged and ignored, as are
//! requests that arrive before any document has loaded.
//!
//! # Documents and generations
//!
//! Each load gets a generation number.  A load or render that completes
//! after a newer load started belongs to the old document: a stale load
//! result is discarded, and a stale render only releases the scheduler.

use tracing::{error, info, warn};

use pageturn_core::{ClientMessage, DeviceStatus, PageNumber, ServerMessage};

use crate::application::document::{DocumentSource, RenderError};
use crate::application::render_scheduler::{RenderRequest, RenderScheduler};
use crate::domain::layout::{tap_direction, NavDirection};

/// Work the caller must carry out for the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerAction {
    /// Render this page of the current document.
    StartRender(PageNumber),
    /// Load a document; report the result with this generation.
    LoadDocument {
        generation: u64,
        source: DocumentSource,
    },
    /// Send an event to the server.
    Send(ClientMessage),
}

/// State of one score display.
#[derive(Debug)]
pub struct Viewer {
    scheduler: RenderScheduler,
    generation: u64,
    page_count: Option<u32>,
    current_page: PageNumber,
    rendered_page: Option<PageNumber>,
    error: Option<String>,
    devices: DeviceStatus,
    settings_open: bool,
    connected: bool,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            scheduler: RenderScheduler::new(),
            generation: 0,
            page_count: None,
            current_page: PageNumber::FIRST,
            rendered_page: None,
            error: None,
            devices: DeviceStatus::default(),
            settings_open: false,
            connected: false,
        }
    }
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read-only view ────────────────────────────────────────────────────────

    /// Generation of the most recent load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    /// The page most recently requested (by the server or a tap).
    pub fn current_page(&self) -> PageNumber {
        self.current_page
    }

    /// The page most recently drawn successfully.
    pub fn rendered_page(&self) -> Option<PageNumber> {
        self.rendered_page
    }

    /// The visible error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn devices(&self) -> &DeviceStatus {
        &self.devices
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn is_rendering(&self) -> bool {
        self.scheduler.is_rendering()
    }

    /// Page indicator text, `"<rendered> / <count>"`.
    pub fn indicator(&self) -> Option<String> {
        match (self.rendered_page, self.page_count) {
            (Some(page), Some(count)) => Some(format!("{page} / {count}")),
            _ => None,
        }
    }

    // ── Server events ─────────────────────────────────────────────────────────

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn on_server_message(&mut self, msg: ServerMessage) -> Option<ViewerAction> {
        match msg {
            ServerMessage::PageChange { page } => self.go_to(page),
            ServerMessage::MidiPortsList { ports, active } => {
                self.devices = DeviceStatus {
                    available: ports,
                    connected: active,
                };
                None
            }
            ServerMessage::MidiStatus {
                available_ports,
                connected_port,
            } => {
                self.devices = DeviceStatus {
                    available: available_ports,
                    connected: connected_port,
                };
                None
            }
        }
    }

    // ── Local navigation ──────────────────────────────────────────────────────

    /// Turns one page from the current one, bounded to the document.
    pub fn navigate(&mut self, direction: NavDirection) -> Option<ViewerAction> {
        let count = self.page_count?;
        let target = match direction {
            NavDirection::Previous => self.current_page.previous()?,
            NavDirection::Next => self.current_page.next_within(count)?,
        };
        self.go_to(target)
    }

    /// A tap at horizontal position `x` on a surface `width` wide.
    pub fn tap(&mut self, x: f64, width: f64) -> Option<ViewerAction> {
        self.navigate(tap_direction(x, width)?)
    }

    fn go_to(&mut self, page: PageNumber) -> Option<ViewerAction> {
        let Some(count) = self.page_count else {
            warn!("ignoring page {page}: no document loaded");
            return None;
        };
        if !page.is_within(count) {
            warn!("ignoring page {page}: document has {count} pages");
            return None;
        }

        self.current_page = page;
        match self.scheduler.request_render(page) {
            RenderRequest::Start(page) => Some(ViewerAction::StartRender(page)),
            RenderRequest::Deferred => None,
        }
    }

    // ── Document lifecycle ────────────────────────────────────────────────────

    /// Starts loading a new document, clearing the current one.
    pub fn begin_load(&mut self, source: DocumentSource) -> ViewerAction {
        self.generation += 1;
        self.page_count = None;
        self.current_page = PageNumber::FIRST;
        self.rendered_page = None;
        self.error = None;
        self.scheduler.clear_pending();
        ViewerAction::LoadDocument {
            generation: self.generation,
            source,
        }
    }

    /// Reports the outcome of a load started by [`Viewer::begin_load`].
    ///
    /// `result` carries the page count on success.
    pub fn on_document_loaded(
        &mut self,
        generation: u64,
        result: Result<u32, RenderError>,
    ) -> Option<ViewerAction> {
        if generation != self.generation {
            info!("discarding superseded document load");
            return None;
        }

        match result {
            Ok(0) => {
                self.fail_load("document has no pages".to_string());
                None
            }
            Ok(count) => {
                info!("document loaded: {count} pages");
                self.page_count = Some(count);
                self.go_to(PageNumber::FIRST)
            }
            Err(e) => {
                self.fail_load(e.to_string());
                None
            }
        }
    }

    fn fail_load(&mut self, reason: String) {
        error!("error loading PDF: {reason}");
        self.error = Some(format!("Error loading PDF: {reason}"));
    }

    /// Reports that the render of `page`, started while `generation` was
    /// current, has finished.
    ///
    /// Returns the next render to start, if one was requested meanwhile.
    pub fn on_render_finished(
        &mut self,
        generation: u64,
        page: PageNumber,
        result: Result<(), RenderError>,
    ) -> Option<ViewerAction> {
        if generation == self.generation {
            match result {
                Ok(()) => {
                    self.rendered_page = Some(page);
                    self.error = None;
                }
                Err(e) => {
                    error!("error rendering page {page}: {e}");
                    self.error = Some(format!("Error rendering page {page}: {e}"));
                }
            }
        }
        self.scheduler.finish_render().map(ViewerAction::StartRender)
    }

    // ── Device panel ──────────────────────────────────────────────────────────

    /// Opens the MIDI settings panel and asks the server for the inputs.
    pub fn open_settings(&mut self) -> ViewerAction {
        self.settings_open = true;
        ViewerAction::Send(ClientMessage::GetMidiPorts)
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
    }

    /// Asks the server to switch to `port`, sent as given.  An empty
    /// selection is ignored.  The panel stays open until closed.
    pub fn select_port(&mut self, port: &str) -> Option<ViewerAction> {
        if port.is_empty() {
            return None;
        }
        Some(ViewerAction::Send(ClientMessage::SetMidiPort(
            port.to_string(),
        )))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
