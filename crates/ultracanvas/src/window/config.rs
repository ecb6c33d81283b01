//! Window configuration and builder.

use ultracanvas_render::Color;

use super::window_type::WindowType;
use crate::id::WindowId;
use crate::tooltip::TooltipStyle;

/// How a window measures and draws text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextShaping {
    /// cosmic-text with installed system fonts.
    #[default]
    System,
    /// Deterministic fixed-advance metrics, independent of installed fonts.
    Builtin,
}

/// Configuration for creating a window.
///
/// Sizes are in logical pixels. A position of `-1` lets the platform
/// choose; a min/max of `-1` means no limit.
///
/// # Example
///
/// ```
/// use ultracanvas::window::{WindowConfig, WindowType};
///
/// let config = WindowConfig::new("Settings")
///     .with_type(WindowType::Dialog)
///     .with_size(480, 320)
///     .with_min_size(320, 200)
///     .with_modal(true);
///
/// assert_eq!(config.clamp_size(100, 1000), (320, 1000));
/// assert!(!config.is_resizable());
/// ```
#[derive(Debug, Clone)]
pub struct WindowConfig {
    title: String,
    width: i32,
    height: i32,
    x: i32,
    y: i32,
    window_type: WindowType,
    resizable: Option<bool>,
    minimizable: bool,
    maximizable: bool,
    closable: bool,
    background: Color,
    min_width: i32,
    min_height: i32,
    max_width: i32,
    max_height: i32,
    opacity: f32,
    parent: Option<WindowId>,
    modal: bool,
    delete_on_close: bool,
    always_on_top: Option<bool>,
    visible: bool,
    text_shaping: TextShaping,
    tooltip_style: TooltipStyle,
}

impl WindowConfig {
    /// A standard 800x600 window with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: 800,
            height: 600,
            x: -1,
            y: -1,
            window_type: WindowType::Standard,
            resizable: None,
            minimizable: true,
            maximizable: true,
            closable: true,
            background: Color::WHITE,
            min_width: -1,
            min_height: -1,
            max_width: -1,
            max_height: -1,
            opacity: 1.0,
            parent: None,
            modal: false,
            delete_on_close: true,
            always_on_top: None,
            visible: true,
            text_shaping: TextShaping::System,
            tooltip_style: TooltipStyle::default(),
        }
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Set the window type; it supplies defaults for the flags left unset.
    pub fn with_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        if !window_type.has_decorations() || window_type == WindowType::Dialog {
            self.minimizable = false;
            self.maximizable = false;
        }
        self
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width.max(0);
        self.height = height.max(0);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_min_size(mut self, width: i32, height: i32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    pub fn with_max_size(mut self, width: i32, height: i32) -> Self {
        self.max_width = width;
        self.max_height = height;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = Some(resizable);
        self
    }

    pub fn with_buttons(mut self, minimizable: bool, maximizable: bool, closable: bool) -> Self {
        self.minimizable = minimizable;
        self.maximizable = maximizable;
        self.closable = closable;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Window opacity, clamped to `0.0..=1.0`.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Make this window transient for `parent`.
    pub fn with_parent(mut self, parent: WindowId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// A modal window blocks input to its parent while it is shown.
    pub fn with_modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    /// Whether closing the window also destroys it. Defaults to `true`;
    /// otherwise a closed window is only hidden.
    pub fn with_delete_on_close(mut self, delete: bool) -> Self {
        self.delete_on_close = delete;
        self
    }

    pub fn with_always_on_top(mut self, on_top: bool) -> Self {
        self.always_on_top = Some(on_top);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_text_shaping(mut self, shaping: TextShaping) -> Self {
        self.text_shaping = shaping;
        self
    }

    pub fn with_tooltip_style(mut self, style: TooltipStyle) -> Self {
        self.tooltip_style = style;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Explicit setting, or the window type's default.
    pub fn is_resizable(&self) -> bool {
        self.resizable.unwrap_or_else(|| self.window_type.is_resizable())
    }

    pub fn is_minimizable(&self) -> bool {
        self.minimizable
    }

    pub fn is_maximizable(&self) -> bool {
        self.maximizable
    }

    pub fn is_closable(&self) -> bool {
        self.closable
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn min_size(&self) -> (i32, i32) {
        (self.min_width, self.min_height)
    }

    pub fn max_size(&self) -> (i32, i32) {
        (self.max_width, self.max_height)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }

    pub fn delete_on_close(&self) -> bool {
        self.delete_on_close
    }

    /// Explicit setting, or the window type's default.
    pub fn is_always_on_top(&self) -> bool {
        self.always_on_top.unwrap_or_else(|| self.window_type.stays_on_top())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text_shaping(&self) -> TextShaping {
        self.text_shaping
    }

    pub fn tooltip_style(&self) -> &TooltipStyle {
        &self.tooltip_style
    }

    /// Clamp a size to the configured limits; `-1` limits are ignored.
    pub fn clamp_size(&self, width: i32, height: i32) -> (i32, i32) {
        fn clamp(v: i32, min: i32, max: i32) -> i32 {
            let v = if min >= 0 { v.max(min) } else { v };
            let v = if max >= 0 { v.min(max) } else { v };
            v.max(0)
        }
        (
            clamp(width, self.min_width, self.max_width),
            clamp(height, self.min_height, self.max_height),
        )
    }

    // Updated by the window as the platform reports changes.

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_size(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
    }

    pub(crate) fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub(crate) fn set_resizable(&mut self, resizable: bool) {
        self.resizable = Some(resizable);
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("UltraCanvas")
    }
}
