//! Page-to-surface geometry.
//!
//! A PDF page has an unscaled size in PDF points; the drawing surface has an
//! available area in pixels.  The page is scaled uniformly so that it fits
//! entirely inside that area, then shrunk by [`FIT_MARGIN`] so a thin border
//! stays visible around it.
//!
//! ```text
//! scale = min(available.width / page.width, available.height / page.height) * FIT_MARGIN
//! ```

/// Fraction of the fitted size actually used.
pub const FIT_MARGIN: f64 = 0.98;

/// Left edge of the "next page" tap zone, as a fraction of the width.
const NEXT_ZONE_START: f64 = 0.7;

/// Right edge of the "previous page" tap zone, as a fraction of the width.
const PREVIOUS_ZONE_END: f64 = 0.3;

/// A width and height, in pixels or PDF points depending on context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides are finite and strictly positive.
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Uniformly scaled copy.
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            width: self.width * scale,
            height: self.height * scale,
        }
    }
}

/// Returns the scale that fits `page` inside `available`, keeping the aspect
/// ratio and leaving the [`FIT_MARGIN`] border.
///
/// Returns `None` when either size has no area (a hidden surface, or a
/// malformed page), since no meaningful scale exists.
pub fn fit_scale(available: Dimensions, page: Dimensions) -> Option<f64> {
    if !available.has_area() || !page.has_area() {
        return None;
    }
    let scale = (available.width / page.width).min(available.height / page.height);
    Some(scale * FIT_MARGIN)
}

/// Direction of a local page turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Previous,
    Next,
}

/// Maps a horizontal tap position to a page turn.
///
/// The left 30% of the surface turns back, the right 30% turns forward, and
/// the middle does nothing.
pub fn tap_direction(x: f64, surface_width: f64) -> Option<NavDirection> {
    if !surface_width.is_finite() || surface_width <= 0.0 || !x.is_finite() {
        return None;
    }
    if x < surface_width * PREVIOUS_ZONE_END {
        Some(NavDirection::Previous)
    } else if x > surface_width * NEXT_ZONE_START {
        Some(NavDirection::Next)
    } else {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
