//! Per-delivery context handed to element event handlers.
//!
//! Handlers cannot reach the window directly: the window is mutably
//! borrowed while it dispatches. Instead they queue [`Request`]s through an
//! [`EventCx`], and the window applies them in order once the handler
//! returns. A request queued by a handler therefore never re-enters
//! dispatch.

use ultracanvas_render::IntPoint;

use crate::event::UcEvent;
use crate::id::{ElementId, WindowId};

/// A deferred action queued by an event handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Schedule a repaint. Repeated requests coalesce.
    Redraw,
    /// Route all pointer events to this element until released.
    CaptureMouse(ElementId),
    ReleaseMouse(ElementId),
    /// Register this element as an active popup.
    AddPopup(ElementId),
    /// Unregister at the start of the next dispatch cycle.
    RemovePopup(ElementId),
    SetFocus(ElementId),
    ClearFocus,
    FocusNext,
    FocusPrevious,
    /// Publish a semantic notification on the window.
    Emit(UcEvent),
    /// `position` is window-local.
    ShowTooltip {
        text: String,
        position: IntPoint,
        immediate: bool,
    },
    HideTooltip {
        immediate: bool,
    },
    /// Close the window once dispatch finishes.
    CloseWindow,
}

/// What the window knows at the time of a delivery.
#[derive(Debug)]
pub(crate) struct DispatchEnv<'a> {
    pub window: WindowId,
    pub timestamp: u64,
    pub capture: Option<ElementId>,
    pub requests: &'a mut Vec<Request>,
}

impl<'a> DispatchEnv<'a> {
    pub fn new(window: WindowId, timestamp: u64, capture: Option<ElementId>, requests: &'a mut Vec<Request>) -> Self {
        Self {
            window,
            timestamp,
            capture,
            requests,
        }
    }
}

/// Handle passed to [`Element::on_event`](crate::Element::on_event).
#[derive(Debug)]
pub struct EventCx<'a> {
    element: ElementId,
    origin: IntPoint,
    window: WindowId,
    timestamp: u64,
    capture: Option<ElementId>,
    requests: &'a mut Vec<Request>,
}

impl<'a> EventCx<'a> {
    pub(crate) fn new(element: ElementId, origin: IntPoint, env: &'a mut DispatchEnv<'_>) -> Self {
        Self {
            element,
            origin,
            window: env.window,
            timestamp: env.timestamp,
            capture: env.capture,
            requests: &mut *env.requests,
        }
    }

    /// The element receiving the event.
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Timestamp of the event being delivered, in milliseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The element's origin in window coordinates.
    pub fn origin(&self) -> IntPoint {
        self.origin
    }

    /// Convert a local point from the event back to window coordinates.
    pub fn window_point(&self, local: IntPoint) -> IntPoint {
        local + self.origin
    }

    /// Whether this element holds the pointer capture.
    pub fn has_capture(&self) -> bool {
        self.capture == Some(self.element)
    }

    pub fn request_redraw(&mut self) {
        self.requests.push(Request::Redraw);
    }

    pub fn capture_mouse(&mut self) {
        self.requests.push(Request::CaptureMouse(self.element));
    }

    pub fn release_mouse(&mut self) {
        self.requests.push(Request::ReleaseMouse(self.element));
    }

    /// Register this element as a popup.
    pub fn add_popup(&mut self) {
        self.requests.push(Request::AddPopup(self.element));
    }

    pub fn remove_popup(&mut self) {
        self.requests.push(Request::RemovePopup(self.element));
    }

    /// Ask for keyboard focus; the window validates the request.
    pub fn request_focus(&mut self) {
        self.requests.push(Request::SetFocus(self.element));
    }

    pub fn clear_focus(&mut self) {
        self.requests.push(Request::ClearFocus);
    }

    pub fn focus_next(&mut self) {
        self.requests.push(Request::FocusNext);
    }

    pub fn focus_previous(&mut self) {
        self.requests.push(Request::FocusPrevious);
    }

    /// Publish a semantic event; `target` defaults to this element.
    pub fn emit(&mut self, mut event: UcEvent) {
        event.target.get_or_insert(self.element);
        event.window = Some(self.window);
        event.timestamp = self.timestamp;
        self.requests.push(Request::Emit(event));
    }

    /// Show a tooltip after the style's delay. `local` is in this element's
    /// coordinates.
    pub fn show_tooltip(&mut self, text: impl Into<String>, local: IntPoint) {
        self.push_tooltip(text.into(), local, false);
    }

    pub fn show_tooltip_immediately(&mut self, text: impl Into<String>, local: IntPoint) {
        self.push_tooltip(text.into(), local, true);
    }

    fn push_tooltip(&mut self, text: String, local: IntPoint, immediate: bool) {
        let position = self.window_point(local);
        self.requests.push(Request::ShowTooltip {
            text,
            position,
            immediate,
        });
    }

    pub fn hide_tooltip(&mut self) {
        self.requests.push(Request::HideTooltip { immediate: false });
    }

    pub fn hide_tooltip_immediately(&mut self) {
        self.requests.push(Request::HideTooltip { immediate: true });
    }

    pub fn close_window(&mut self) {
        self.requests.push(Request::CloseWindow);
    }
}
