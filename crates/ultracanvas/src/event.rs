//! Normalized event records.
//!
//! Platform adapters translate native input into [`UcEvent`] values before
//! they reach a window. Every event carries its kind, a monotonic timestamp,
//! the owning window and the modifier mask; the remaining fields are filled
//! according to the kind:
//!
//! | Kind group | Fields used |
//! |---|---|
//! | pointer | `x`, `y` (window-local), `button`, `wheel_delta`, `wheel_delta_x` |
//! | keyboard | `virtual_key`, `native_key`, `key_repeat`, `text` (KeyChar only) |
//! | window lifecycle | `x`, `y` for moves, `width`, `height` for resizes |
//! | semantic | `target`, `user_data` |
//!
//! While an event is delivered to an element, `x` and `y` are rewritten to
//! the element's local coordinates. [`EventCx::window_point`] recovers the
//! window-local position.
//!
//! [`EventCx::window_point`]: crate::EventCx::window_point

use ultracanvas_render::IntPoint;

use crate::id::{ElementId, WindowId};

/// Event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    MouseDoubleClick,
    MouseWheel,
    KeyDown,
    KeyUp,
    /// Composed text input.
    KeyChar,
    FocusGained,
    FocusLost,
    WindowResize,
    WindowMove,
    WindowFocus,
    WindowBlur,
    WindowShow,
    WindowHide,
    WindowClose,
    /// The native surface needs repainting.
    WindowExpose,
    /// A dropdown or list changed its selection; `user_data` is the index.
    DropdownSelect,
    /// A tab container switched tabs; `user_data` is the tab index.
    TabChange,
    /// A value widget changed; `user_data` carries the new value.
    ValueChange,
}

impl EventKind {
    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::MouseDown
                | Self::MouseUp
                | Self::MouseMove
                | Self::MouseEnter
                | Self::MouseLeave
                | Self::MouseDoubleClick
                | Self::MouseWheel
        )
    }

    pub fn is_keyboard(self) -> bool {
        matches!(self, Self::KeyDown | Self::KeyUp | Self::KeyChar)
    }

    /// Window lifecycle notifications handled by the window itself.
    pub fn is_lifecycle(self) -> bool {
        matches!(
            self,
            Self::WindowResize
                | Self::WindowMove
                | Self::WindowFocus
                | Self::WindowBlur
                | Self::WindowShow
                | Self::WindowHide
                | Self::WindowClose
                | Self::WindowExpose
        )
    }

    /// Widget-level notifications such as selection changes.
    pub fn is_semantic(self) -> bool {
        matches!(self, Self::DropdownSelect | Self::TabChange | Self::ValueChange)
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
    /// Extra button 1 (usually "back").
    X1,
    /// Extra button 2 (usually "forward").
    X2,
}

bitflags::bitflags! {
    /// Keyboard modifier mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CONTROL = 2;
        const ALT = 4;
        /// Windows key, Cmd on macOS.
        const SUPER = 8;
    }
}

/// OS-independent virtual key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[rustfmt::skip]
pub enum VirtualKey {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    // Navigation
    Up, Down, Left, Right,
    Home, End, PageUp, PageDown,

    // Editing
    Insert, Delete, Backspace, Tab, Enter, Escape, Space,

    // Modifiers
    Shift, Control, Alt, Super,

    #[default]
    Unknown,
}

impl VirtualKey {
    #[rustfmt::skip]
    const LETTERS: [VirtualKey; 26] = [
        Self::A, Self::B, Self::C, Self::D, Self::E, Self::F, Self::G, Self::H, Self::I,
        Self::J, Self::K, Self::L, Self::M, Self::N, Self::O, Self::P, Self::Q, Self::R,
        Self::S, Self::T, Self::U, Self::V, Self::W, Self::X, Self::Y, Self::Z,
    ];

    #[rustfmt::skip]
    const DIGITS: [VirtualKey; 10] = [
        Self::Digit0, Self::Digit1, Self::Digit2, Self::Digit3, Self::Digit4,
        Self::Digit5, Self::Digit6, Self::Digit7, Self::Digit8, Self::Digit9,
    ];

    #[rustfmt::skip]
    const FUNCTION: [VirtualKey; 12] = [
        Self::F1, Self::F2, Self::F3, Self::F4, Self::F5, Self::F6,
        Self::F7, Self::F8, Self::F9, Self::F10, Self::F11, Self::F12,
    ];

    /// Map a character to its key, ignoring case.
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_uppercase() {
            l @ 'A'..='Z' => Self::LETTERS[(l as u8 - b'A') as usize],
            d @ '0'..='9' => Self::DIGITS[(d as u8 - b'0') as usize],
            ' ' => Self::Space,
            '\t' => Self::Tab,
            '\r' | '\n' => Self::Enter,
            _ => Self::Unknown,
        }
    }

    /// Function key `F<n>` for `n` in 1..=12.
    pub fn function(n: u8) -> Self {
        match n {
            1..=12 => Self::FUNCTION[n as usize - 1],
            _ => Self::Unknown,
        }
    }

    pub fn is_modifier(self) -> bool {
        matches!(self, Self::Shift | Self::Control | Self::Alt | Self::Super)
    }

    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            Self::Up | Self::Down | Self::Left | Self::Right | Self::Home | Self::End | Self::PageUp | Self::PageDown
        )
    }
}

/// A normalized event record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UcEvent {
    pub kind: EventKind,
    /// Milliseconds on the monotonic clock.
    pub timestamp: u64,
    pub window: Option<WindowId>,
    pub modifiers: Modifiers,
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
    /// Vertical wheel notches, positive away from the user.
    pub wheel_delta: i32,
    pub wheel_delta_x: i32,
    pub virtual_key: VirtualKey,
    pub native_key: u32,
    pub key_repeat: bool,
    /// UTF-8 text for `KeyChar`.
    pub text: String,
    /// Target of a synthesized event.
    pub target: Option<ElementId>,
    pub user_data: i64,
    /// New size for `WindowResize`.
    pub width: i32,
    pub height: i32,
}

impl Default for EventKind {
    fn default() -> Self {
        Self::MouseMove
    }
}

impl UcEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// A pointer event at a window-local position.
    pub fn mouse(kind: EventKind, x: i32, y: i32, button: MouseButton) -> Self {
        Self {
            kind,
            x,
            y,
            button,
            ..Default::default()
        }
    }

    pub fn mouse_down(x: i32, y: i32) -> Self {
        Self::mouse(EventKind::MouseDown, x, y, MouseButton::Left)
    }

    pub fn mouse_up(x: i32, y: i32) -> Self {
        Self::mouse(EventKind::MouseUp, x, y, MouseButton::Left)
    }

    pub fn mouse_move(x: i32, y: i32) -> Self {
        Self::mouse(EventKind::MouseMove, x, y, MouseButton::None)
    }

    pub fn wheel(x: i32, y: i32, delta: i32, delta_x: i32) -> Self {
        Self {
            kind: EventKind::MouseWheel,
            x,
            y,
            wheel_delta: delta,
            wheel_delta_x: delta_x,
            ..Default::default()
        }
    }

    pub fn key(kind: EventKind, key: VirtualKey) -> Self {
        Self {
            kind,
            virtual_key: key,
            ..Default::default()
        }
    }

    pub fn key_down(key: VirtualKey) -> Self {
        Self::key(EventKind::KeyDown, key)
    }

    pub fn text_input(text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::KeyChar,
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn resize(width: i32, height: i32) -> Self {
        Self {
            kind: EventKind::WindowResize,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn moved(x: i32, y: i32) -> Self {
        Self {
            kind: EventKind::WindowMove,
            x,
            y,
            ..Default::default()
        }
    }

    /// A semantic notification from `target`.
    pub fn notification(kind: EventKind, target: ElementId, user_data: i64) -> Self {
        Self {
            kind,
            target: Some(target),
            user_data,
            ..Default::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_window(mut self, window: WindowId) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_native_key(mut self, native_key: u32, repeat: bool) -> Self {
        self.native_key = native_key;
        self.key_repeat = repeat;
        self
    }

    pub fn is_pointer(&self) -> bool {
        self.kind.is_pointer()
    }

    pub fn is_keyboard(&self) -> bool {
        self.kind.is_keyboard()
    }

    pub fn is_lifecycle(&self) -> bool {
        self.kind.is_lifecycle()
    }

    /// Input events are pointer or keyboard events.
    pub fn is_input(&self) -> bool {
        self.is_pointer() || self.is_keyboard()
    }

    pub fn position(&self) -> IntPoint {
        IntPoint::new(self.x, self.y)
    }

    /// Copy with the position shifted into a frame whose origin is `origin`.
    pub fn localized(&self, origin: IntPoint) -> Self {
        let mut local = self.clone();
        local.x -= origin.x;
        local.y -= origin.y;
        local
    }

    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn control(&self) -> bool {
        self.modifiers.contains(Modifiers::CONTROL)
    }
}
