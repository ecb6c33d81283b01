//! Identifiers for elements and windows.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

slotmap::new_key_type! {
    /// Identifies an element within its window's [`ElementTree`](crate::ElementTree).
    ///
    /// IDs are generational: a removed element's ID never aliases a later one.
    pub struct ElementId;
}

/// Opaque window identifier, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

impl WindowId {
    /// Allocate a fresh ID.
    pub fn next() -> Self {
        Self(NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an ID from its integer form, e.g. one carried in an event.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

static_assertions::assert_impl_all!(ElementId: Send, Sync, Copy);
static_assertions::assert_impl_all!(WindowId: Send, Sync, Copy);
