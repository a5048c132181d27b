//! Application layer for pageturn-viewer.
//!
//! # Responsibilities
//!
//! - The coalescing render discipline (`render_scheduler`)
//! - Page bounds, document lifecycle, indicator and device panel
//!   (`viewer`)
//! - The traits the external document-rendering library is driven through,
//!   and the fit-and-draw procedure built on them (`document`)
//!
//! # What does NOT belong here?
//!
//! - Spawning tasks or awaiting renders (that is `infrastructure::runtime`)
//! - Sockets (that is `infrastructure::connection`)

pub mod document;
pub mod render_scheduler;
pub mod viewer;
