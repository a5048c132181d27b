//! The document-rendering collaborator.
//!
//! PDF parsing and rasterising are delegated to an external library.  These
//! traits describe the small slice of it the viewer needs:
//!
//! ```text
//! DocumentLoader::load(source) ──► Document
//! Document::page(n)            ──► Page
//! Page::viewport(scale)        ──► Dimensions
//! Page::render(surface, size)  ──► ()
//! ```
//!
//! Every failure is reported as a [`RenderError`] carrying the library's
//! reason string.
//!
//! # Why `async_trait`? (for beginners)
//!
//! Loading a document and drawing a page take time, so they are `async`.
//! Rust traits used as trait objects (`dyn Document`) cannot declare plain
//! `async fn` methods on the toolchain this workspace targets.  The
//! `#[async_trait]` macro rewrites each `async fn` into a method returning a
//! boxed future, which makes the traits object-safe.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use pageturn_core::PageNumber;

use crate::domain::layout::{fit_scale, Dimensions};

/// Failures reported by the document-rendering collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The document could not be fetched or parsed.
    #[error("{0}")]
    DocumentLoad(String),

    /// The document has no such page, or it could not be read.
    #[error("page {page} unavailable: {reason}")]
    PageUnavailable { page: PageNumber, reason: String },

    /// Drawing onto the surface failed.
    #[error("draw failed: {0}")]
    Draw(String),
}

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Fetched from a URL, e.g. the score served next to the viewer.
    Url(String),
    /// A file the user picked locally.
    Bytes(Arc<[u8]>),
}

/// The drawing target, e.g. a canvas element.
pub trait Surface: Send {
    /// Space available for the page.
    fn available(&self) -> Dimensions;

    /// Resizes the surface to exactly `size` before a page is drawn.
    fn resize(&mut self, size: Dimensions);
}

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: DocumentSource) -> Result<Arc<dyn Document>, RenderError>;
}

#[async_trait]
pub trait Document: Send + Sync {
    /// Number of pages; valid page numbers are `1..=page_count()`.
    fn page_count(&self) -> u32;

    async fn page(&self, number: PageNumber) -> Result<Box<dyn Page>, RenderError>;
}

#[async_trait]
pub trait Page: Send + Sync {
    /// Size of the page at `scale` (1.0 is the unscaled size).
    fn viewport(&self, scale: f64) -> Dimensions;

    /// Draws the page onto `surface`, which has already been sized to
    /// `viewport`.
    async fn render(
        &self,
        surface: &mut dyn Surface,
        viewport: Dimensions,
    ) -> Result<(), RenderError>;
}

/// Fetches page `number`, sizes `surface` to fit it and draws it.
///
/// Returns the size the page was drawn at.
pub async fn render_page(
    document: &dyn Document,
    number: PageNumber,
    surface: &mut dyn Surface,
) -> Result<Dimensions, RenderError> {
    let page = document.page(number).await?;
    let unscaled = page.viewport(1.0);
    let scale = fit_scale(surface.available(), unscaled).ok_or_else(|| {
        RenderError::Draw(format!(
            "cannot fit {}x{} page into {}x{} surface",
            unscaled.width,
            unscaled.height,
            surface.available().width,
            surface.available().height
        ))
    })?;

    let viewport = page.viewport(scale);
    surface.resize(viewport);
    page.render(surface, viewport).await?;
    Ok(viewport)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
