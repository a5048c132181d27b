//! pageturn-viewer library entry point.
//!
//! # What does the viewer do? (for beginners)
//!
//! A *viewer* is one score display, typically a browser tab on a tablet
//! standing on the music stand.  It shows one page of a PDF at a time and
//! turns pages when the server says so:
//!
//! 1. Connects to the server over WebSocket and receives `page_change` and
//!    `midi_status` events.
//! 2. Ignores pages outside the loaded document.
//! 3. Renders the requested page, scaled to fit the drawing surface.
//! 4. Coalesces bursts: while one page is being drawn, only the most recent
//!    request is remembered, so a fast series of pedal presses never builds a
//!    backlog of stale renders.
//!
//! Parsing and rasterising PDF content is not done here.  The viewer drives an
//! external document-rendering library through the traits in
//! [`application::document`].
//!
//! # Layers
//!
//! ```text
//! domain/          Fit-to-viewport scaling, tap zones (pure math)
//! application/     RenderScheduler, Viewer state, rendering collaborator traits
//! infrastructure/  Async runtime that drives renders, WebSocket connection
//! ```

/// Domain layer: pure geometry.
pub mod domain;

/// Application layer: render scheduling and viewer state.
pub mod application;

/// Infrastructure layer: async runtime and server connection.
pub mod infrastructure;

pub use application::document::{Document, DocumentLoader, DocumentSource, Page, RenderError, Surface};
pub use application::render_scheduler::{RenderRequest, RenderScheduler};
pub use application::viewer::{Viewer, ViewerAction};
pub use domain::layout::{fit_scale, tap_direction, Dimensions, NavDirection, FIT_MARGIN};
