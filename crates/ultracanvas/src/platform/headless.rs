//! In-memory platform for tests and offscreen use.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use cursor_icon::CursorIcon;
use parking_lot::Mutex;
use ultracanvas_core::CoreError;
use ultracanvas_core::logging::targets;
use ultracanvas_render::PixelBuffer;

use super::{NativeWindow, Platform};
use crate::event::UcEvent;
use crate::id::WindowId;
use crate::window::WindowConfig;

/// A call a window made on its native counterpart.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    Created(WindowId),
    SetTitle(WindowId, String),
    SetVisible(WindowId, bool),
    SetPosition(WindowId, i32, i32),
    SetSize(WindowId, i32, i32),
    SetSizeLimits(WindowId, (i32, i32), (i32, i32)),
    SetResizable(WindowId, bool),
    SetMinimized(WindowId, bool),
    SetMaximized(WindowId, bool),
    SetFullscreen(WindowId, bool),
    SetCursor(WindowId, CursorIcon),
    RequestRedraw(WindowId),
    Present { window: WindowId, width: u32, height: u32 },
    Close(WindowId),
}

#[derive(Debug, Default)]
struct Shared {
    events: Mutex<VecDeque<UcEvent>>,
    calls: Mutex<Vec<NativeCall>>,
    last_frame: Mutex<Option<PixelBuffer>>,
}

/// Test-side view of a headless platform: inject events, inspect calls.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHandle {
    shared: Arc<Shared>,
}

impl HeadlessHandle {
    /// Queue an event for the next poll.
    pub fn push_event(&self, event: UcEvent) {
        self.shared.events.lock().push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.shared.events.lock().len()
    }

    /// Every native call so far.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.shared.calls.lock().clone()
    }

    /// Native calls since the last take.
    pub fn take_calls(&self) -> Vec<NativeCall> {
        std::mem::take(&mut *self.shared.calls.lock())
    }

    /// Number of frames presented, across all windows.
    pub fn present_count(&self) -> usize {
        self.shared
            .calls
            .lock()
            .iter()
            .filter(|c| matches!(c, NativeCall::Present { .. }))
            .count()
    }

    /// The most recently presented frame.
    pub fn last_frame(&self) -> Option<PixelBuffer> {
        self.shared.last_frame.lock().clone()
    }

    fn record(&self, call: NativeCall) {
        self.shared.calls.lock().push(call);
    }
}

/// A platform without a display.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    handle: HeadlessHandle,
    fail_creation: bool,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> HeadlessHandle {
        self.handle.clone()
    }

    /// Make subsequent window creation fail, to exercise error paths.
    pub fn set_fail_creation(&mut self, fail: bool) {
        self.fail_creation = fail;
    }
}

impl Platform for HeadlessPlatform {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_window(&mut self, id: WindowId, config: &WindowConfig) -> Result<Box<dyn NativeWindow>, CoreError> {
        if self.fail_creation {
            return Err(CoreError::WindowCreation(format!(
                "headless platform refused '{}'",
                config.title()
            )));
        }
        tracing::debug!(target: targets::PLATFORM, %id, title = config.title(), "headless window created");
        Ok(Box::new(HeadlessWindow::new(id, self.handle.clone())))
    }

    /// Returns whatever is queued without waiting.
    fn poll_events(&mut self, _timeout: Option<Duration>) -> Vec<UcEvent> {
        self.handle.shared.events.lock().drain(..).collect()
    }
}

/// A native window that records every call.
#[derive(Debug)]
pub struct HeadlessWindow {
    id: WindowId,
    handle: HeadlessHandle,
}

impl HeadlessWindow {
    pub fn new(id: WindowId, handle: HeadlessHandle) -> Self {
        handle.record(NativeCall::Created(id));
        Self { id, handle }
    }
}

impl NativeWindow for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn set_title(&mut self, title: &str) {
        self.handle.record(NativeCall::SetTitle(self.id, title.to_string()));
    }

    fn set_visible(&mut self, visible: bool) {
        self.handle.record(NativeCall::SetVisible(self.id, visible));
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.handle.record(NativeCall::SetPosition(self.id, x, y));
    }

    fn set_size(&mut self, width: i32, height: i32) {
        self.handle.record(NativeCall::SetSize(self.id, width, height));
    }

    fn set_size_limits(&mut self, min: (i32, i32), max: (i32, i32)) {
        self.handle.record(NativeCall::SetSizeLimits(self.id, min, max));
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.handle.record(NativeCall::SetResizable(self.id, resizable));
    }

    fn set_minimized(&mut self, minimized: bool) {
        self.handle.record(NativeCall::SetMinimized(self.id, minimized));
    }

    fn set_maximized(&mut self, maximized: bool) {
        self.handle.record(NativeCall::SetMaximized(self.id, maximized));
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.handle.record(NativeCall::SetFullscreen(self.id, fullscreen));
    }

    fn set_cursor(&mut self, cursor: CursorIcon) {
        self.handle.record(NativeCall::SetCursor(self.id, cursor));
    }

    fn request_redraw(&mut self) {
        self.handle.record(NativeCall::RequestRedraw(self.id));
    }

    fn present(&mut self, frame: &PixelBuffer) -> Result<(), CoreError> {
        self.handle.record(NativeCall::Present {
            window: self.id,
            width: frame.width(),
            height: frame.height(),
        });
        *self.handle.shared.last_frame.lock() = Some(frame.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.handle.record(NativeCall::Close(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn test_events_drain_in_order() {
        let mut platform = HeadlessPlatform::new();
        let handle = platform.handle();
        handle.push_event(UcEvent::mouse_move(1, 1));
        handle.push_event(UcEvent::mouse_down(2, 2));
        let events = platform.poll_events(Some(Duration::ZERO));
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::MouseDown);
        assert!(platform.poll_events(None).is_empty());
    }

    #[test]
    fn test_window_calls_are_recorded() {
        let mut platform = HeadlessPlatform::new();
        let handle = platform.handle();
        let id = WindowId::next();
        let mut native = platform.create_window(id, &WindowConfig::new("t")).unwrap();
        native.set_title("renamed");
        native.present(&PixelBuffer::new(4, 4)).unwrap();

        let calls = handle.take_calls();
        assert_eq!(calls[0], NativeCall::Created(id));
        assert_eq!(calls[1], NativeCall::SetTitle(id, "renamed".into()));
        assert_eq!(handle.present_count(), 0);
        assert_eq!(handle.last_frame().map(|f| f.width()), Some(4));
    }

    #[test]
    fn test_creation_failure() {
        let mut platform = HeadlessPlatform::new();
        platform.set_fail_creation(true);
        assert!(matches!(
            platform.create_window(WindowId::next(), &WindowConfig::default()),
            Err(CoreError::WindowCreation(_))
        ));
    }
}
