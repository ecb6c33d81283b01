//! Client-side widgets and fixtures shared by the integration tests.
//!
//! The widgets here use only the public API, the way a widget library
//! built on the runtime would.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ultracanvas::platform::{HeadlessHandle, HeadlessWindow};
use ultracanvas::render::{Color, DrawCommand, FontSlant, FontWeight, IntPoint, IntRect, RenderContext};
use ultracanvas::window::TextShaping;
use ultracanvas::{
    Clock, Element, ElementBase, EventCx, EventKind, Layer, ManualClock, UcEvent, Window, WindowConfig,
    WindowId,
};

pub const ITEM_HEIGHT: i32 = 24;

/// Route logs to the test writer. Set `RUST_LOG` to see them.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A window on the headless platform with deterministic text metrics.
pub struct Harness {
    pub window: Window,
    pub handle: HeadlessHandle,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_config(WindowConfig::new("test").with_size(width, height))
    }

    pub fn with_config(config: WindowConfig) -> Self {
        init_logging();
        let handle = HeadlessHandle::default();
        let clock = Arc::new(ManualClock::new());
        let id = WindowId::next();
        let native = Box::new(HeadlessWindow::new(id, handle.clone()));
        let window = Window::create(
            id,
            config.with_text_shaping(TextShaping::Builtin),
            native,
            clock.clone(),
        )
        .expect("headless window");
        Self {
            window,
            handle,
            clock,
        }
    }

    /// Send an event stamped with the current clock.
    pub fn send(&mut self, event: UcEvent) -> bool {
        let now = self.clock.now_millis();
        self.window.handle_event(event.with_timestamp(now))
    }

    pub fn advance(&mut self, by: Duration) {
        self.clock.advance(by);
        let now = self.clock.now();
        self.window.tick(now);
    }

    /// Render unconditionally and return the frame's commands.
    pub fn frame(&mut self) -> Vec<DrawCommand> {
        self.window.request_redraw();
        self.window.render();
        self.window.last_commands().to_vec()
    }

    pub fn texts(&mut self) -> Vec<String> {
        self.frame()
            .iter()
            .filter_map(|c| c.text().map(str::to_string))
            .collect()
    }
}

// =============================================================================
// Dropdown
// =============================================================================

/// A single-selection dropdown. The list opens below the button and is
/// registered as a popup while open.
#[derive(Debug)]
pub struct Dropdown {
    base: ElementBase,
    items: Vec<String>,
    selected: i32,
    hovered: i32,
    open: bool,
    closed_z: i32,
    pub base_presses: usize,
}

impl Dropdown {
    pub fn new(id: &str, bounds: IntRect, items: &[&str]) -> Self {
        Self {
            base: ElementBase::new(id, bounds).with_layer(Layer::Controls),
            items: items.iter().map(|s| s.to_string()).collect(),
            selected: -1,
            hovered: -1,
            open: false,
            closed_z: Layer::Controls.z(),
            base_presses: 0,
        }
    }

    pub fn selected(&self) -> i32 {
        self.selected
    }

    pub fn hovered(&self) -> i32 {
        self.hovered
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn list_rect(&self) -> IntRect {
        let b = self.base.bounds();
        IntRect::new(0, b.height, b.width, ITEM_HEIGHT * self.items.len() as i32)
    }

    fn item_at(&self, local: IntPoint) -> Option<usize> {
        let list = self.list_rect();
        if local.x < list.x || local.x >= list.x + list.width || local.y < list.y {
            return None;
        }
        let index = ((local.y - list.y) / ITEM_HEIGHT) as usize;
        (index < self.items.len()).then_some(index)
    }

    fn open(&mut self, cx: &mut EventCx<'_>) {
        self.open = true;
        self.closed_z = self.base.z_index();
        self.base.set_z_index(Layer::Dropdowns.z());
        cx.add_popup();
        cx.request_redraw();
    }

    fn close(&mut self, cx: &mut EventCx<'_>) {
        self.open = false;
        self.hovered = -1;
        self.base.set_z_index(self.closed_z);
        cx.remove_popup();
        cx.request_redraw();
    }
}

impl Element for Dropdown {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "Dropdown"
    }

    fn render(&self, ctx: &mut dyn RenderContext) {
        let b = self.base.bounds();
        ctx.push_state();
        ctx.set_fill_color(Color::WHITE);
        ctx.fill_rectangle(0.0, 0.0, b.width as f32, b.height as f32);
        if let Some(text) = usize::try_from(self.selected).ok().and_then(|i| self.items.get(i)) {
            ctx.set_font_face("Sans", FontWeight::NORMAL, FontSlant::Normal);
            ctx.set_text_color(Color::BLACK);
            ctx.draw_text_in_rect(text, 4.0, 0.0, b.width as f32 - 8.0, b.height as f32);
        }
        ctx.pop_state();
    }

    fn render_popup(&self, ctx: &mut dyn RenderContext) {
        if !self.open {
            return;
        }
        let list = self.list_rect();
        ctx.push_state();
        ctx.set_fill_color(Color::LIGHT_GRAY);
        ctx.fill_rectangle(list.x as f32, list.y as f32, list.width as f32, list.height as f32);
        for (i, item) in self.items.iter().enumerate() {
            let y = list.y + i as i32 * ITEM_HEIGHT;
            ctx.draw_text_in_rect(item, 4.0, y as f32, list.width as f32 - 8.0, ITEM_HEIGHT as f32);
        }
        ctx.pop_state();
    }

    fn on_event(&mut self, cx: &mut EventCx<'_>, event: &UcEvent) -> bool {
        let local = event.position();
        match event.kind {
            EventKind::MouseDown if self.open => {
                if let Some(index) = self.item_at(local) {
                    self.selected = index as i32;
                    cx.emit(UcEvent::notification(EventKind::DropdownSelect, cx.element(), index as i64));
                    self.close(cx);
                } else {
                    self.close(cx);
                }
                true
            }
            EventKind::MouseDown => {
                self.base_presses += 1;
                self.open(cx);
                true
            }
            EventKind::MouseMove if self.open => {
                let hovered = self.item_at(local).map_or(-1, |i| i as i32);
                if hovered != self.hovered {
                    self.hovered = hovered;
                    cx.request_redraw();
                }
                true
            }
            _ => false,
        }
    }

    fn on_outside_event(&mut self, cx: &mut EventCx<'_>, event: &UcEvent) -> bool {
        if event.kind == EventKind::MouseDown {
            self.close(cx);
            return true;
        }
        false
    }

    fn dismiss_popup(&mut self, cx: &mut EventCx<'_>) {
        self.close(cx);
    }

    fn popup_rect(&self) -> Option<IntRect> {
        self.open.then(|| {
            let b = self.base.bounds();
            let list = self.list_rect();
            IntRect::new(0, 0, b.width, b.height + list.height)
        })
    }
}

// =============================================================================
// Button
// =============================================================================

/// A focusable button that counts what it receives.
#[derive(Debug)]
pub struct Button {
    base: ElementBase,
    pub presses: usize,
    pub focus_gained: usize,
    pub focus_lost: usize,
    pub enters: usize,
    pub leaves: usize,
    pub redraw_on_press: bool,
    pub tooltip: Option<String>,
}

impl Button {
    pub fn new(id: &str, bounds: IntRect) -> Self {
        Self {
            base: ElementBase::new(id, bounds).with_layer(Layer::Controls).focusable(),
            presses: 0,
            focus_gained: 0,
            focus_lost: 0,
            enters: 0,
            leaves: 0,
            redraw_on_press: false,
            tooltip: None,
        }
    }

    pub fn with_tooltip(mut self, text: &str) -> Self {
        self.tooltip = Some(text.to_string());
        self
    }
}

impl Element for Button {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "Button"
    }

    fn render(&self, ctx: &mut dyn RenderContext) {
        let b = self.base.bounds();
        ctx.push_state();
        ctx.set_fill_color(if self.base.is_focused() { Color::BLUE } else { Color::GRAY });
        ctx.fill_rounded_rectangle(0.0, 0.0, b.width as f32, b.height as f32, 3.0);
        ctx.pop_state();
    }

    fn on_event(&mut self, cx: &mut EventCx<'_>, event: &UcEvent) -> bool {
        match event.kind {
            EventKind::MouseDown => {
                self.presses += 1;
                if self.redraw_on_press {
                    cx.request_redraw();
                }
                true
            }
            EventKind::MouseEnter => {
                self.enters += 1;
                if let Some(text) = &self.tooltip {
                    cx.show_tooltip(text.clone(), event.position());
                }
                true
            }
            EventKind::MouseLeave => {
                self.leaves += 1;
                if self.tooltip.is_some() {
                    cx.hide_tooltip();
                }
                true
            }
            EventKind::FocusGained => {
                self.focus_gained += 1;
                true
            }
            EventKind::FocusLost => {
                self.focus_lost += 1;
                true
            }
            _ => false,
        }
    }
}
