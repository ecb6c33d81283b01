//! Window lifecycle state.

use std::fmt;

/// Lifecycle state of a window.
///
/// ```text
///   Normal <-> Minimized | Maximized | Fullscreen
///   any shown state -> Hidden -> Normal
///   any live state -> Closing -> DeleteRequested -> Deleted
///                            \-> Hidden (close without delete)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
    Hidden,
    Closing,
    DeleteRequested,
    Deleted,
}

impl WindowState {
    /// Shown on screen in some form.
    pub fn is_shown(self) -> bool {
        matches!(self, Self::Normal | Self::Minimized | Self::Maximized | Self::Fullscreen)
    }

    /// Closing or past it.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::DeleteRequested | Self::Deleted)
    }

    pub fn can_transition_to(self, to: WindowState) -> bool {
        use WindowState::*;
        match (self, to) {
            (a, b) if a == b => false,
            (a, b) if a.is_shown() && b.is_shown() => true,
            (a, Hidden) if a.is_shown() => true,
            (Hidden, Normal) => true,
            (a, Closing) if !a.is_terminal() => true,
            (Closing, DeleteRequested | Hidden) => true,
            (DeleteRequested, Deleted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
