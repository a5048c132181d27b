//! Domain layer for pageturn-viewer.
//!
//! Pure geometry with no I/O: how a page is scaled into the drawing surface
//! and which part of the surface a tap lands in.

pub mod layout;
