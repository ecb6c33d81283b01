//! Window type definitions.

use crate::zorder::Layer;

/// The kind of top-level window.
///
/// The type supplies defaults for decorations, stacking, taskbar presence
/// and resizability. Explicit [`WindowConfig`](super::WindowConfig) settings
/// override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowType {
    /// A normal top-level window with full decorations.
    #[default]
    Standard,

    /// A dialog, usually transient for a parent and often modal.
    ///
    /// Dialog windows typically:
    /// - Have a close button but no minimize/maximize
    /// - Are not resizable by default
    /// - Don't appear in the taskbar
    Dialog,

    /// A frameless window for menus and dropdown lists that must escape
    /// their parent's bounds.
    Popup,

    /// A floating palette or inspector that stays above normal windows.
    Tool,

    /// A startup splash screen.
    Splash,

    /// Covers the whole monitor.
    Fullscreen,

    /// A normal window without decorations.
    Borderless,

    /// A frameless always-on-top surface (HUDs, notifications).
    Overlay,
}

impl WindowType {
    /// Check if this window type should have decorations by default.
    pub fn has_decorations(&self) -> bool {
        matches!(self, WindowType::Standard | WindowType::Dialog | WindowType::Tool)
    }

    /// Check if this window type should stay on top by default.
    pub fn stays_on_top(&self) -> bool {
        matches!(
            self,
            WindowType::Tool | WindowType::Popup | WindowType::Splash | WindowType::Overlay
        )
    }

    /// Check if this window type should appear in the taskbar.
    pub fn shows_in_taskbar(&self) -> bool {
        matches!(
            self,
            WindowType::Standard | WindowType::Fullscreen | WindowType::Borderless
        )
    }

    /// Check if this window type is typically resizable.
    pub fn is_resizable(&self) -> bool {
        matches!(self, WindowType::Standard | WindowType::Borderless)
    }

    /// Layer that content of this window type usually sits on.
    pub fn default_layer(&self) -> Layer {
        match self {
            WindowType::Popup => Layer::Popups,
            WindowType::Dialog => Layer::Modals,
            WindowType::Overlay => Layer::Overlays,
            _ => Layer::Content,
        }
    }
}

impl std::fmt::Display for WindowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WindowType::Standard => "Standard",
            WindowType::Dialog => "Dialog",
            WindowType::Popup => "Popup",
            WindowType::Tool => "Tool",
            WindowType::Splash => "Splash",
            WindowType::Fullscreen => "Fullscreen",
            WindowType::Borderless => "Borderless",
            WindowType::Overlay => "Overlay",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_type_default() {
        assert_eq!(WindowType::default(), WindowType::Standard);
    }

    #[test]
    fn test_window_type_decorations() {
        assert!(WindowType::Standard.has_decorations());
        assert!(WindowType::Dialog.has_decorations());
        assert!(!WindowType::Popup.has_decorations());
        assert!(!WindowType::Borderless.has_decorations());
        assert!(!WindowType::Overlay.has_decorations());
    }

    #[test]
    fn test_window_type_stacking_and_taskbar() {
        assert!(!WindowType::Standard.stays_on_top());
        assert!(WindowType::Overlay.stays_on_top());
        assert!(WindowType::Standard.shows_in_taskbar());
        assert!(!WindowType::Dialog.shows_in_taskbar());
        assert!(!WindowType::Dialog.is_resizable());
        assert_eq!(WindowType::Popup.default_layer(), Layer::Popups);
    }

    #[test]
    fn test_window_type_display() {
        assert_eq!(WindowType::Standard.to_string(), "Standard");
        assert_eq!(WindowType::Overlay.to_string(), "Overlay");
    }
}
