//! The element contract.
//!
//! Every node in a window's tree implements [`Element`]. Shared state
//! (identifier, geometry, flags) lives in an [`ElementBase`] the element
//! embeds; the tree reads it for hit-testing, z-ordering and focus.
//!
//! # Coordinates
//!
//! Bounds are in parent-local coordinates. When an element renders, the
//! context is already translated to its origin, so drawing at `(0, 0)`
//! paints its top-left corner. Events arrive with `x`/`y` in the same local
//! frame.
//!
//! # Example
//!
//! ```
//! use ultracanvas::{Element, ElementBase, EventCx, UcEvent};
//! use ultracanvas::render::{Color, IntRect, RenderContext};
//!
//! struct Swatch {
//!     base: ElementBase,
//!     color: Color,
//! }
//!
//! impl Element for Swatch {
//!     fn base(&self) -> &ElementBase {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut ElementBase {
//!         &mut self.base
//!     }
//!
//!     fn render(&self, ctx: &mut dyn RenderContext) {
//!         let bounds = self.base.bounds();
//!         ctx.push_state();
//!         ctx.set_fill_color(self.color);
//!         ctx.fill_rectangle(0.0, 0.0, bounds.width as f32, bounds.height as f32);
//!         ctx.pop_state();
//!     }
//! }
//!
//! let swatch = Swatch {
//!     base: ElementBase::new("swatch", IntRect::new(0, 0, 16, 16)),
//!     color: Color::RED,
//! };
//! assert!(swatch.contains_local(ultracanvas::render::IntPoint::new(15, 15)));
//! ```

use std::any::Any;

use cursor_icon::CursorIcon;
use ultracanvas_render::{Color, IntPoint, IntRect, RenderContext};

use crate::context::EventCx;
use crate::event::UcEvent;
use crate::zorder::Layer;

/// State shared by every element.
#[derive(Debug, Clone)]
pub struct ElementBase {
    identifier: String,
    bounds: IntRect,
    z_index: i32,
    visible: bool,
    enabled: bool,
    focused: bool,
    hovered: bool,
    accepts_focus: bool,
    tab_stop: bool,
    clip_children: bool,
    scroll_offset: IntPoint,
    cursor: CursorIcon,
    dirty: bool,
}

impl ElementBase {
    /// A visible, enabled element on the content layer.
    pub fn new(identifier: impl Into<String>, bounds: IntRect) -> Self {
        Self {
            identifier: identifier.into(),
            bounds,
            z_index: Layer::Content.z(),
            visible: true,
            enabled: true,
            focused: false,
            hovered: false,
            accepts_focus: false,
            tab_stop: true,
            clip_children: false,
            scroll_offset: IntPoint::ZERO,
            cursor: CursorIcon::Default,
            dirty: true,
        }
    }

    // =========================================================================
    // Builders
    // =========================================================================

    pub fn with_z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn with_layer(self, layer: Layer) -> Self {
        self.with_z_index(layer.z())
    }

    /// Make the element focusable and part of the tab order.
    pub fn focusable(mut self) -> Self {
        self.accepts_focus = true;
        self.tab_stop = true;
        self
    }

    pub fn with_cursor(mut self, cursor: CursorIcon) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_clip_children(mut self, clip: bool) -> Self {
        self.clip_children = clip;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Bounds in parent-local coordinates.
    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    pub fn position(&self) -> IntPoint {
        self.bounds.origin()
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// The element's own visibility flag. Use
    /// [`ElementTree::is_effectively_visible`](crate::ElementTree::is_effectively_visible)
    /// to account for ancestors.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn accepts_focus(&self) -> bool {
        self.accepts_focus
    }

    pub fn is_tab_stop(&self) -> bool {
        self.tab_stop
    }

    pub fn clips_children(&self) -> bool {
        self.clip_children
    }

    pub fn scroll_offset(&self) -> IntPoint {
        self.scroll_offset
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // =========================================================================
    // Setters (each marks the element dirty when the value changes)
    // =========================================================================

    pub fn set_bounds(&mut self, bounds: IntRect) {
        if self.bounds != bounds {
            self.bounds = bounds;
            self.dirty = true;
        }
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.set_bounds(IntRect::new(x, y, self.bounds.width, self.bounds.height));
    }

    pub fn set_size(&mut self, width: i32, height: i32) {
        self.set_bounds(IntRect::new(self.bounds.x, self.bounds.y, width.max(0), height.max(0)));
    }

    pub fn set_z_index(&mut self, z: i32) {
        if self.z_index != z {
            self.z_index = z;
            self.dirty = true;
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.dirty = true;
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.dirty = true;
        }
    }

    pub fn set_accepts_focus(&mut self, accepts: bool) {
        self.accepts_focus = accepts;
    }

    pub fn set_tab_stop(&mut self, tab_stop: bool) {
        self.tab_stop = tab_stop;
    }

    pub fn set_clip_children(&mut self, clip: bool) {
        if self.clip_children != clip {
            self.clip_children = clip;
            self.dirty = true;
        }
    }

    pub fn set_scroll_offset(&mut self, offset: IntPoint) {
        if self.scroll_offset != offset {
            self.scroll_offset = offset;
            self.dirty = true;
        }
    }

    pub fn set_cursor(&mut self, cursor: CursorIcon) {
        self.cursor = cursor;
    }

    /// Flag the element for repaint.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // Focus and hover flags are owned by the window; elements only read them.

    pub(crate) fn set_focused(&mut self, focused: bool) {
        if self.focused != focused {
            self.focused = focused;
            self.dirty = true;
        }
    }

    pub(crate) fn set_hovered(&mut self, hovered: bool) {
        if self.hovered != hovered {
            self.hovered = hovered;
            self.dirty = true;
        }
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Whether the element can take keyboard focus right now.
    pub fn can_focus(&self) -> bool {
        self.visible && self.enabled && self.accepts_focus
    }
}

/// A node in the UI tree.
///
/// Only [`base`](Self::base) and [`base_mut`](Self::base_mut) are required;
/// everything else has a default that suits a passive element.
pub trait Element: Any {
    fn base(&self) -> &ElementBase;

    fn base_mut(&mut self) -> &mut ElementBase;

    /// Name used in logs and tree dumps.
    fn type_name(&self) -> &'static str {
        "Element"
    }

    /// Whether children may be attached.
    fn is_container(&self) -> bool {
        false
    }

    /// Draw the element in local coordinates.
    ///
    /// Every `push_state` must be matched by a `pop_state` before returning.
    fn render(&self, _ctx: &mut dyn RenderContext) {}

    /// Draw the floating part of a registered popup (a dropdown list, a
    /// menu). Called after the whole tree, in local coordinates.
    fn render_popup(&self, _ctx: &mut dyn RenderContext) {}

    /// Handle an event. Returns `true` when handled, which stops bubbling.
    fn on_event(&mut self, _cx: &mut EventCx<'_>, _event: &UcEvent) -> bool {
        false
    }

    /// A press landed outside every registered popup while this element was
    /// registered as one. Returning `true` consumes the press.
    fn on_outside_event(&mut self, _cx: &mut EventCx<'_>, _event: &UcEvent) -> bool {
        false
    }

    /// Close the popup, e.g. on an unhandled Escape.
    fn dismiss_popup(&mut self, cx: &mut EventCx<'_>) {
        cx.remove_popup();
    }

    /// Area of the floating part in local coordinates, when registered as a
    /// popup. `None` means the element's own bounds.
    fn popup_rect(&self) -> Option<IntRect> {
        None
    }

    /// Hit-test a local point. Override for non-rectangular shapes.
    fn contains_local(&self, point: IntPoint) -> bool {
        let b = self.base().bounds();
        point.x >= 0 && point.y >= 0 && point.x < b.width && point.y < b.height
    }
}

/// A plain composite element with an optional background.
#[derive(Debug, Clone)]
pub struct Container {
    base: ElementBase,
    background: Option<Color>,
}

impl Container {
    pub fn new(identifier: impl Into<String>, bounds: IntRect) -> Self {
        Self {
            base: ElementBase::new(identifier, bounds),
            background: None,
        }
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_clip(mut self) -> Self {
        self.base.set_clip_children(true);
        self
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn set_background(&mut self, color: Option<Color>) {
        self.background = color;
        self.base.mark_dirty();
    }
}

impl Element for Container {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "Container"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn render(&self, ctx: &mut dyn RenderContext) {
        let Some(color) = self.background else {
            return;
        };
        let b = self.base.bounds();
        ctx.push_state();
        ctx.set_fill_color(color);
        ctx.fill_rectangle(0.0, 0.0, b.width as f32, b.height as f32);
        ctx.pop_state();
    }
}
