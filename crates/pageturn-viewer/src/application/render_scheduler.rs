//! RenderScheduler: one render at a time, most recent request wins.
//!
//! Drawing a PDF page takes long enough that several page changes can arrive
//! while one render is still running.  Rendering each of them in turn would
//! build a backlog and show pages the performer has already left, so the
//! scheduler keeps exactly two pieces of state:
//!
//! - `rendering`: whether a render is in flight.
//! - `pending_page`: the *latest* page requested while it was in flight.
//!
//! A new request during a render overwrites `pending_page`; when the render
//! finishes, only that page is drawn next.  A burst of N requests therefore
//! costs one extra render, not N.
//!
//! The scheduler performs no I/O.  Callers start the actual render when
//! [`RenderScheduler::request_render`] returns [`RenderRequest::Start`] and
//! report completion with [`RenderScheduler::finish_render`].
//!
//! ```text
//!            request(p)                       finish() [pending = None]
//!   Idle ───────────────► Rendering(p) ─────────────────────────────► Idle
//!                          │     ▲
//!              request(q)  │     │ finish() [pending = Some(q)] → start q
//!              pending = q ▼     │
//!                         Rendering(p), pending q
//! ```

use tracing::debug;

use pageturn_core::PageNumber;

/// What the caller must do after [`RenderScheduler::request_render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    /// Nothing was in flight: start rendering this page now.
    Start(PageNumber),
    /// A render is in flight: the page was stored as pending.
    Deferred,
}

/// The coalescing render state machine.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    rendering: bool,
    pending_page: Option<PageNumber>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn pending_page(&self) -> Option<PageNumber> {
        self.pending_page
    }

    /// Requests that `page` be shown.
    pub fn request_render(&mut self, page: PageNumber) -> RenderRequest {
        if self.rendering {
            if let Some(superseded) = self.pending_page.replace(page) {
                debug!("page {superseded} superseded by {page} before rendering");
            }
            RenderRequest::Deferred
        } else {
            self.rendering = true;
            RenderRequest::Start(page)
        }
    }

    /// Marks the in-flight render as done, whether it succeeded or failed.
    ///
    /// Returns the pending page if there was one; it has already been
    /// started, so the caller must render it next.
    pub fn finish_render(&mut self) -> Option<PageNumber> {
        self.rendering = false;
        let next = self.pending_page.take()?;
        match self.request_render(next) {
            RenderRequest::Start(page) => Some(page),
            RenderRequest::Deferred => None,
        }
    }

    /// Forgets the pending page without touching the in-flight render.
    ///
    /// Used when a new document replaces the one the pending page belonged to.
    pub fn clear_pending(&mut self) {
        self.pending_page = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
