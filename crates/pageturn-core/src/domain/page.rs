//! Page numbering.
//!
//! MIDI hardware counts programs from 0; printed scores count pages from 1.
//! The offset between the two is fixed: program `n` always means page `n + 1`.
//! It is not configurable.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A 1-based page number.
///
/// The server has no notion of how many pages a document has, so a
/// `PageNumber` is only guaranteed to be non-zero.  Viewers check the upper
/// bound against their own document with [`PageNumber::is_within`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    /// The first page of any document.
    pub const FIRST: PageNumber = PageNumber(NonZeroU32::MIN);

    /// Returns `None` for `0`, which is never a valid page.
    pub fn new(page: u32) -> Option<Self> {
        NonZeroU32::new(page).map(Self)
    }

    /// Returns the raw 1-based value.
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns `true` if this page exists in a document of `page_count` pages.
    pub fn is_within(self, page_count: u32) -> bool {
        self.get() <= page_count
    }

    /// The page before this one, or `None` on the first page.
    pub fn previous(self) -> Option<Self> {
        Self::new(self.get() - 1)
    }

    /// The page after this one, or `None` if it would exceed `page_count`.
    pub fn next_within(self, page_count: u32) -> Option<Self> {
        let next = self.get().checked_add(1)?;
        Self::new(next).filter(|p| p.is_within(page_count))
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Translates a zero-based MIDI program number into a one-based page.
///
/// Every program in `0..=127` maps to exactly one page in `1..=128`.
///
/// # Examples
///
/// ```rust
/// use pageturn_core::page_for_program;
///
/// assert_eq!(page_for_program(4).get(), 5);
/// ```
pub fn page_for_program(program: u8) -> PageNumber {
    // `u8::MAX + 1` still fits in a u32, so the sum is never zero.
    PageNumber(NonZeroU32::MIN.saturating_add(u32::from(program)))
}
