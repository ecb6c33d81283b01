//! winit backend with softbuffer presentation.
//!
//! The application loop owns the schedule, so the event loop is pumped
//! rather than run: each [`Platform::poll_events`] call hands control to
//! winit for at most the given timeout and returns whatever arrived.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use ::winit::application::ApplicationHandler;
use ::winit::dpi::{PhysicalPosition, PhysicalSize};
use ::winit::event::{ElementState, Ime, KeyEvent, MouseScrollDelta, WindowEvent};
use ::winit::event_loop::{ActiveEventLoop, EventLoop};
use ::winit::keyboard::{Key, KeyCode, ModifiersState, NamedKey, PhysicalKey};
use ::winit::platform::pump_events::EventLoopExtPumpEvents;
use ::winit::platform::scancode::PhysicalKeyExtScancode;
use ::winit::window::{Fullscreen, Window as OsWindow, WindowAttributes, WindowButtons, WindowLevel};
use cursor_icon::CursorIcon;
use parking_lot::Mutex;
use ultracanvas_core::logging::targets;
use ultracanvas_core::{CoreError, SharedClock};
use ultracanvas_render::PixelBuffer;

use super::click::ClickTracker;
use super::{NativeWindow, Platform};
use crate::event::{EventKind, Modifiers, MouseButton, UcEvent, VirtualKey};
use crate::id::WindowId;
use crate::window::WindowConfig;

/// Pixels of precise scrolling per wheel notch.
const PIXELS_PER_NOTCH: f64 = 40.0;

type WindowMap = Arc<Mutex<HashMap<::winit::window::WindowId, WindowId>>>;

/// Per-window pointer bookkeeping.
#[derive(Debug, Default)]
struct PointerState {
    x: i32,
    y: i32,
    clicks: ClickTracker,
}

/// Native windows through winit.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    windows: WindowMap,
    pointers: HashMap<WindowId, PointerState>,
    modifiers: Modifiers,
    clock: SharedClock,
}

impl std::fmt::Debug for WinitPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinitPlatform")
            .field("windows", &self.windows.lock().len())
            .finish_non_exhaustive()
    }
}

impl WinitPlatform {
    /// Connect to the display server.
    pub fn new(clock: SharedClock) -> Result<Self, CoreError> {
        let event_loop = EventLoop::new().map_err(|e| CoreError::Platform(e.to_string()))?;
        tracing::info!(target: targets::PLATFORM, "winit event loop created");
        Ok(Self {
            event_loop,
            windows: Arc::new(Mutex::new(HashMap::new())),
            pointers: HashMap::new(),
            modifiers: Modifiers::empty(),
            clock,
        })
    }
}

/// `-1` on either axis means no limit.
fn size_limit((width, height): (i32, i32)) -> Option<PhysicalSize<u32>> {
    (width >= 0 && height >= 0).then(|| PhysicalSize::new(width as u32, height as u32))
}

fn attributes(config: &WindowConfig) -> WindowAttributes {
    let window_type = config.window_type();
    let mut buttons = WindowButtons::empty();
    if config.is_minimizable() {
        buttons |= WindowButtons::MINIMIZE;
    }
    if config.is_maximizable() {
        buttons |= WindowButtons::MAXIMIZE;
    }
    if config.is_closable() {
        buttons |= WindowButtons::CLOSE;
    }

    let mut attrs = OsWindow::default_attributes()
        .with_title(config.title())
        .with_inner_size(PhysicalSize::new(config.width().max(1) as u32, config.height().max(1) as u32))
        .with_resizable(config.is_resizable())
        .with_decorations(window_type.has_decorations())
        .with_enabled_buttons(buttons)
        .with_visible(config.is_visible())
        .with_transparent(config.opacity() < 1.0);
    if config.is_always_on_top() {
        attrs = attrs.with_window_level(WindowLevel::AlwaysOnTop);
    }
    if config.x() >= 0 && config.y() >= 0 {
        attrs = attrs.with_position(PhysicalPosition::new(config.x(), config.y()));
    }
    if let Some(size) = size_limit(config.min_size()) {
        attrs = attrs.with_min_inner_size(size);
    }
    if let Some(size) = size_limit(config.max_size()) {
        attrs = attrs.with_max_inner_size(size);
    }
    if window_type == crate::window::WindowType::Fullscreen {
        attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    attrs
}

impl Platform for WinitPlatform {
    fn name(&self) -> &'static str {
        "winit"
    }

    fn create_window(&mut self, id: WindowId, config: &WindowConfig) -> Result<Box<dyn NativeWindow>, CoreError> {
        // Windows are created outside the pump so creation can report errors
        // synchronously.
        #[allow(deprecated)]
        let window = self
            .event_loop
            .create_window(attributes(config))
            .map_err(|e| CoreError::WindowCreation(e.to_string()))?;
        let window = Arc::new(window);

        let context = softbuffer::Context::new(Arc::clone(&window))
            .map_err(|e| CoreError::WindowCreation(e.to_string()))?;
        let surface = softbuffer::Surface::new(&context, Arc::clone(&window))
            .map_err(|e| CoreError::WindowCreation(e.to_string()))?;

        self.windows.lock().insert(window.id(), id);
        self.pointers.insert(id, PointerState::default());
        tracing::debug!(target: targets::PLATFORM, %id, title = config.title(), "native window created");

        Ok(Box::new(WinitWindow {
            id,
            window,
            _context: context,
            surface,
            windows: Arc::clone(&self.windows),
        }))
    }

    fn poll_events(&mut self, timeout: Option<Duration>) -> Vec<UcEvent> {
        let mut collector = Collector {
            windows: &self.windows,
            pointers: &mut self.pointers,
            modifiers: &mut self.modifiers,
            clock: &self.clock,
            events: Vec::new(),
        };
        self.event_loop.pump_app_events(timeout, &mut collector);
        let events = collector.events;
        tracing::trace!(target: targets::PLATFORM, count = events.len(), "pumped events");
        events
    }
}

/// Translates winit callbacks into events for one pump.
struct Collector<'a> {
    windows: &'a WindowMap,
    pointers: &'a mut HashMap<WindowId, PointerState>,
    modifiers: &'a mut Modifiers,
    clock: &'a SharedClock,
    events: Vec<UcEvent>,
}

impl Collector<'_> {
    fn push(&mut self, window: WindowId, event: UcEvent) {
        let timestamp = self.clock.now_millis();
        self.events.push(
            event
                .with_window(window)
                .with_timestamp(timestamp)
                .with_modifiers(*self.modifiers),
        );
    }

    fn pointer(&mut self, window: WindowId) -> &mut PointerState {
        self.pointers.entry(window).or_default()
    }

    fn key_event(&mut self, window: WindowId, event: KeyEvent) {
        let kind = match event.state {
            ElementState::Pressed => EventKind::KeyDown,
            ElementState::Released => EventKind::KeyUp,
        };
        let native = event.physical_key.to_scancode().unwrap_or(0);
        let key = map_key(&event.logical_key, event.physical_key);
        self.push(window, UcEvent::key(kind, key).with_native_key(native, event.repeat));

        if kind == EventKind::KeyDown
            && let Some(text) = event.text
            && text.chars().any(|c| !c.is_control())
            && !self.modifiers.intersects(Modifiers::CONTROL | Modifiers::SUPER)
        {
            self.push(window, UcEvent::text_input(text.as_str()));
        }
    }
}

impl ApplicationHandler for Collector<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        os_id: ::winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.windows.lock().get(&os_id).copied() else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => {
                self.push(window, UcEvent::resize(size.width as i32, size.height as i32));
            }
            WindowEvent::Moved(pos) => self.push(window, UcEvent::moved(pos.x, pos.y)),
            WindowEvent::CloseRequested => self.push(window, UcEvent::new(EventKind::WindowClose)),
            WindowEvent::Focused(true) => self.push(window, UcEvent::new(EventKind::WindowFocus)),
            WindowEvent::Focused(false) => {
                self.pointer(window).clicks.reset();
                self.push(window, UcEvent::new(EventKind::WindowBlur));
            }
            WindowEvent::Occluded(hidden) => {
                let kind = if hidden {
                    EventKind::WindowHide
                } else {
                    EventKind::WindowShow
                };
                self.push(window, UcEvent::new(kind));
            }
            WindowEvent::RedrawRequested => self.push(window, UcEvent::new(EventKind::WindowExpose)),
            WindowEvent::ModifiersChanged(mods) => *self.modifiers = map_modifiers(mods.state()),
            WindowEvent::KeyboardInput { event, .. } => self.key_event(window, event),
            WindowEvent::Ime(Ime::Commit(text)) => self.push(window, UcEvent::text_input(text)),
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x.round() as i32, position.y.round() as i32);
                let pointer = self.pointer(window);
                pointer.x = x;
                pointer.y = y;
                self.push(window, UcEvent::mouse_move(x, y));
            }
            WindowEvent::CursorLeft { .. } => {
                let pointer = self.pointer(window);
                let (x, y) = (pointer.x, pointer.y);
                self.push(window, UcEvent::mouse(EventKind::MouseLeave, x, y, MouseButton::None));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_button(button);
                let timestamp = self.clock.now_millis();
                let pointer = self.pointer(window);
                let (x, y) = (pointer.x, pointer.y);
                match state {
                    ElementState::Pressed => {
                        let double = pointer.clicks.press(button, x, y, timestamp);
                        self.push(window, UcEvent::mouse(EventKind::MouseDown, x, y, button));
                        if double {
                            self.push(window, UcEvent::mouse(EventKind::MouseDoubleClick, x, y, button));
                        }
                    }
                    ElementState::Released => {
                        self.push(window, UcEvent::mouse(EventKind::MouseUp, x, y, button));
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x.round() as i32, y.round() as i32),
                    MouseScrollDelta::PixelDelta(p) => (
                        (p.x / PIXELS_PER_NOTCH).round() as i32,
                        (p.y / PIXELS_PER_NOTCH).round() as i32,
                    ),
                };
                if dx != 0 || dy != 0 {
                    let pointer = self.pointer(window);
                    let (x, y) = (pointer.x, pointer.y);
                    self.push(window, UcEvent::wheel(x, y, dy, dx));
                }
            }
            _ => {}
        }
    }
}

fn map_modifiers(state: ModifiersState) -> Modifiers {
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, state.shift_key());
    mods.set(Modifiers::CONTROL, state.control_key());
    mods.set(Modifiers::ALT, state.alt_key());
    mods.set(Modifiers::SUPER, state.super_key());
    mods
}

fn map_button(button: ::winit::event::MouseButton) -> MouseButton {
    use ::winit::event::MouseButton as Os;
    match button {
        Os::Left => MouseButton::Left,
        Os::Right => MouseButton::Right,
        Os::Middle => MouseButton::Middle,
        Os::Back => MouseButton::X1,
        Os::Forward => MouseButton::X2,
        Os::Other(_) => MouseButton::None,
    }
}

/// Named keys come from the logical key, letters and digits from the
/// physical position so shortcuts work on any layout.
fn map_key(logical: &Key, physical: PhysicalKey) -> VirtualKey {
    if let Key::Named(named) = logical {
        let key = match named {
            NamedKey::ArrowUp => VirtualKey::Up,
            NamedKey::ArrowDown => VirtualKey::Down,
            NamedKey::ArrowLeft => VirtualKey::Left,
            NamedKey::ArrowRight => VirtualKey::Right,
            NamedKey::Home => VirtualKey::Home,
            NamedKey::End => VirtualKey::End,
            NamedKey::PageUp => VirtualKey::PageUp,
            NamedKey::PageDown => VirtualKey::PageDown,
            NamedKey::Insert => VirtualKey::Insert,
            NamedKey::Delete => VirtualKey::Delete,
            NamedKey::Backspace => VirtualKey::Backspace,
            NamedKey::Tab => VirtualKey::Tab,
            NamedKey::Enter => VirtualKey::Enter,
            NamedKey::Escape => VirtualKey::Escape,
            NamedKey::Space => VirtualKey::Space,
            NamedKey::Shift => VirtualKey::Shift,
            NamedKey::Control => VirtualKey::Control,
            NamedKey::Alt => VirtualKey::Alt,
            NamedKey::Super | NamedKey::Meta => VirtualKey::Super,
            NamedKey::F1 => VirtualKey::F1,
            NamedKey::F2 => VirtualKey::F2,
            NamedKey::F3 => VirtualKey::F3,
            NamedKey::F4 => VirtualKey::F4,
            NamedKey::F5 => VirtualKey::F5,
            NamedKey::F6 => VirtualKey::F6,
            NamedKey::F7 => VirtualKey::F7,
            NamedKey::F8 => VirtualKey::F8,
            NamedKey::F9 => VirtualKey::F9,
            NamedKey::F10 => VirtualKey::F10,
            NamedKey::F11 => VirtualKey::F11,
            NamedKey::F12 => VirtualKey::F12,
            _ => VirtualKey::Unknown,
        };
        if key != VirtualKey::Unknown {
            return key;
        }
    }

    let PhysicalKey::Code(code) = physical else {
        return VirtualKey::Unknown;
    };
    let letter = match code {
        KeyCode::KeyA => 'a',
        KeyCode::KeyB => 'b',
        KeyCode::KeyC => 'c',
        KeyCode::KeyD => 'd',
        KeyCode::KeyE => 'e',
        KeyCode::KeyF => 'f',
        KeyCode::KeyG => 'g',
        KeyCode::KeyH => 'h',
        KeyCode::KeyI => 'i',
        KeyCode::KeyJ => 'j',
        KeyCode::KeyK => 'k',
        KeyCode::KeyL => 'l',
        KeyCode::KeyM => 'm',
        KeyCode::KeyN => 'n',
        KeyCode::KeyO => 'o',
        KeyCode::KeyP => 'p',
        KeyCode::KeyQ => 'q',
        KeyCode::KeyR => 'r',
        KeyCode::KeyS => 's',
        KeyCode::KeyT => 't',
        KeyCode::KeyU => 'u',
        KeyCode::KeyV => 'v',
        KeyCode::KeyW => 'w',
        KeyCode::KeyX => 'x',
        KeyCode::KeyY => 'y',
        KeyCode::KeyZ => 'z',
        KeyCode::Digit0 | KeyCode::Numpad0 => '0',
        KeyCode::Digit1 | KeyCode::Numpad1 => '1',
        KeyCode::Digit2 | KeyCode::Numpad2 => '2',
        KeyCode::Digit3 | KeyCode::Numpad3 => '3',
        KeyCode::Digit4 | KeyCode::Numpad4 => '4',
        KeyCode::Digit5 | KeyCode::Numpad5 => '5',
        KeyCode::Digit6 | KeyCode::Numpad6 => '6',
        KeyCode::Digit7 | KeyCode::Numpad7 => '7',
        KeyCode::Digit8 | KeyCode::Numpad8 => '8',
        KeyCode::Digit9 | KeyCode::Numpad9 => '9',
        KeyCode::NumpadEnter => '\n',
        _ => return VirtualKey::Unknown,
    };
    VirtualKey::from_char(letter)
}

/// A winit window presenting through softbuffer.
struct WinitWindow {
    id: WindowId,
    window: Arc<OsWindow>,
    _context: softbuffer::Context<Arc<OsWindow>>,
    surface: softbuffer::Surface<Arc<OsWindow>, Arc<OsWindow>>,
    windows: WindowMap,
}

impl NativeWindow for WinitWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    fn set_visible(&mut self, visible: bool) {
        self.window.set_visible(visible);
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.window.set_outer_position(PhysicalPosition::new(x, y));
    }

    fn set_size(&mut self, width: i32, height: i32) {
        let _ = self
            .window
            .request_inner_size(PhysicalSize::new(width.max(1) as u32, height.max(1) as u32));
    }

    fn set_size_limits(&mut self, min: (i32, i32), max: (i32, i32)) {
        self.window.set_min_inner_size(size_limit(min));
        self.window.set_max_inner_size(size_limit(max));
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.window.set_resizable(resizable);
    }

    fn set_minimized(&mut self, minimized: bool) {
        self.window.set_minimized(minimized);
    }

    fn set_maximized(&mut self, maximized: bool) {
        self.window.set_maximized(maximized);
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.window
            .set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }

    fn set_cursor(&mut self, cursor: CursorIcon) {
        self.window.set_cursor(cursor);
    }

    fn request_redraw(&mut self) {
        self.window.request_redraw();
    }

    fn present(&mut self, frame: &PixelBuffer) -> Result<(), CoreError> {
        let (Some(width), Some(height)) = (NonZeroU32::new(frame.width()), NonZeroU32::new(frame.height())) else {
            return Ok(());
        };
        self.surface
            .resize(width, height)
            .map_err(|e| CoreError::Platform(e.to_string()))?;
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| CoreError::Platform(e.to_string()))?;
        for (dst, px) in buffer.iter_mut().zip(frame.as_bytes().chunks_exact(4)) {
            *dst = (u32::from(px[0]) << 16) | (u32::from(px[1]) << 8) | u32::from(px[2]);
        }
        self.window.pre_present_notify();
        buffer.present().map_err(|e| CoreError::Platform(e.to_string()))
    }

    fn close(&mut self) {
        self.window.set_visible(false);
        self.windows.lock().remove(&self.window.id());
        tracing::debug!(target: targets::PLATFORM, id = %self.id, "native window closed");
    }
}
