//! Event routing within a window.
//!
//! # Pointer Events
//!
//! A pointer event goes through these steps, stopping at the first that
//! handles it:
//!
//! 1. Points outside the window are discarded.
//! 2. Deferred popup removals are applied.
//! 3. On a move, the hovered chain is updated and `MouseLeave`/`MouseEnter`
//!    are synthesized for elements that left or joined it.
//! 4. The topmost popup containing the point receives the event.
//! 5. A press outside every popup is offered to each popup as an outside
//!    notification; a popup that acts on it consumes the press.
//! 6. An element holding the capture receives the event exclusively.
//! 7. Otherwise the event is hit-tested to the deepest topmost element and
//!    bubbles up through its ancestors until one handles it.
//!
//! # Keyboard Events
//!
//! The topmost popup sees key events first, then the focused element with
//! bubbling. Unhandled Escape dismisses the topmost popup and unhandled
//! Tab/Shift+Tab move focus.
//!
//! Disabled elements do not receive input events.

use cursor_icon::CursorIcon;
use ultracanvas_core::logging::targets;
use ultracanvas_render::{IntPoint, IntRect};

use crate::context::{DispatchEnv, EventCx};
use crate::element::Element;
use crate::event::{EventKind, UcEvent, VirtualKey};
use crate::focus::FocusManager;
use crate::id::ElementId;
use crate::popup::PopupRegistry;
use crate::tree::ElementTree;
use crate::zorder;

/// Outcome of routing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// An element (or a window shortcut) handled the event.
    Accepted(Option<ElementId>),
    /// Delivered but nobody handled it.
    Ignored,
    /// Dropped before reaching any element.
    Discarded,
}

impl DispatchResult {
    pub fn was_handled(self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The element that handled the event, if any.
    pub fn handler(self) -> Option<ElementId> {
        match self {
            Self::Accepted(id) => id,
            _ => None,
        }
    }
}

/// Pointer state kept by a window between events.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    capture: Option<ElementId>,
    /// Hovered element and its ancestors, deepest first.
    hover_chain: Vec<ElementId>,
    last_pointer: Option<IntPoint>,
    cursor: CursorIcon,
}

impl InputState {
    /// The element holding the pointer capture.
    pub fn capture(&self) -> Option<ElementId> {
        self.capture
    }

    pub(crate) fn set_capture(&mut self, id: Option<ElementId>) {
        if self.capture != id {
            tracing::trace!(target: targets::DISPATCH, from = ?self.capture, to = ?id, "capture changed");
            self.capture = id;
        }
    }

    /// The deepest hovered element.
    pub fn hovered(&self) -> Option<ElementId> {
        self.hover_chain.first().copied()
    }

    pub fn hover_chain(&self) -> &[ElementId] {
        &self.hover_chain
    }

    pub fn last_pointer(&self) -> Option<IntPoint> {
        self.last_pointer
    }

    /// Cursor resolved from the hovered chain.
    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// Drop every reference to `id`.
    pub(crate) fn forget(&mut self, id: ElementId) {
        if self.capture == Some(id) {
            self.capture = None;
        }
        self.hover_chain.retain(|&h| h != id);
    }
}

/// Deliver an event to one element without bubbling.
///
/// The event is converted to the element's local coordinates. Returns
/// whether the element handled it.
pub(crate) fn send_direct(tree: &mut ElementTree, id: ElementId, event: &UcEvent, env: &mut DispatchEnv<'_>) -> bool {
    let origin = tree.window_position(id);
    let Some(element) = tree.get_mut(id) else {
        return false;
    };
    if event.is_input() && !element.base().is_enabled() {
        return false;
    }
    let local = event.localized(origin);
    let mut cx = EventCx::new(id, origin, env);
    element.on_event(&mut cx, &local)
}

fn send_outside(tree: &mut ElementTree, id: ElementId, event: &UcEvent, env: &mut DispatchEnv<'_>) -> bool {
    let origin = tree.window_position(id);
    let Some(element) = tree.get_mut(id) else {
        return false;
    };
    let local = event.localized(origin);
    let mut cx = EventCx::new(id, origin, env);
    element.on_outside_event(&mut cx, &local)
}

/// Deliver to `start`, then to each ancestor until one handles the event.
pub(crate) fn bubble(
    tree: &mut ElementTree,
    start: ElementId,
    event: &UcEvent,
    env: &mut DispatchEnv<'_>,
) -> Option<ElementId> {
    let mut chain = vec![start];
    chain.extend(tree.ancestors(start));
    chain.into_iter().find(|&id| send_direct(tree, id, event, env))
}

/// Window-space area of a registered popup.
pub fn popup_area(tree: &ElementTree, id: ElementId) -> Option<IntRect> {
    let element = tree.get(id)?;
    let local = element
        .popup_rect()
        .unwrap_or_else(|| IntRect::new(0, 0, element.base().bounds().width, element.base().bounds().height));
    Some(local.translated(tree.window_position(id)))
}

fn popup_contains(tree: &ElementTree, id: ElementId, point: IntPoint) -> bool {
    tree.is_effectively_visible(id) && popup_area(tree, id).is_some_and(|r| r.contains(point))
}

/// Routes events through one window's tree, popups, focus and pointer state.
pub(crate) struct Router<'a> {
    pub tree: &'a mut ElementTree,
    pub popups: &'a mut PopupRegistry,
    pub focus: &'a mut FocusManager,
    pub input: &'a mut InputState,
    pub env: DispatchEnv<'a>,
    /// Window bounds in window coordinates.
    pub bounds: IntRect,
}

impl Router<'_> {
    pub fn dispatch(&mut self, event: &UcEvent) -> DispatchResult {
        if event.is_pointer() {
            self.dispatch_pointer(event)
        } else if event.is_keyboard() {
            self.dispatch_keyboard(event)
        } else {
            DispatchResult::Ignored
        }
    }

    // =========================================================================
    // Pointer
    // =========================================================================

    fn dispatch_pointer(&mut self, event: &UcEvent) -> DispatchResult {
        let point = event.position();

        // A window-level leave clears hover wherever the pointer last was.
        if event.kind == EventKind::MouseLeave {
            self.update_hover(None, event);
            self.input.last_pointer = None;
            return DispatchResult::Ignored;
        }

        if !self.bounds.contains(point) {
            match event.kind {
                EventKind::MouseMove => self.update_hover(None, event),
                EventKind::MouseUp => self.input.set_capture(None),
                _ => {}
            }
            tracing::trace!(target: targets::DISPATCH, kind = ?event.kind, x = point.x, y = point.y, "pointer event outside window discarded");
            return DispatchResult::Discarded;
        }
        self.input.last_pointer = Some(point);

        self.popups.process_pending();

        let popup_hit = self.popups.topmost_where(|id| popup_contains(self.tree, id, point));

        if event.kind == EventKind::MouseMove {
            let target = popup_hit.or_else(|| zorder::hit_test(self.tree, point));
            self.update_hover(target, event);
        }

        if let Some(popup) = popup_hit {
            if send_direct(self.tree, popup, event, &mut self.env) {
                tracing::trace!(target: targets::DISPATCH, kind = ?event.kind, ?popup, "handled by popup");
                return DispatchResult::Accepted(Some(popup));
            }
        } else if self.popups.has_active() && matches!(event.kind, EventKind::MouseDown | EventKind::MouseDoubleClick) {
            let mut consumed = None;
            for popup in self.popups.active() {
                if send_outside(self.tree, popup, event, &mut self.env) {
                    consumed.get_or_insert(popup);
                }
            }
            if let Some(popup) = consumed {
                tracing::debug!(target: targets::POPUP, ?popup, "outside press consumed by popup");
                return DispatchResult::Accepted(Some(popup));
            }
        }

        if let Some(captured) = self.input.capture {
            if self.tree.is_attached(captured) {
                let handled = send_direct(self.tree, captured, event, &mut self.env);
                return if handled {
                    DispatchResult::Accepted(Some(captured))
                } else {
                    DispatchResult::Ignored
                };
            }
            self.input.set_capture(None);
        }

        let Some(target) = zorder::hit_test(self.tree, point) else {
            return DispatchResult::Ignored;
        };
        match bubble(self.tree, target, event, &mut self.env) {
            Some(handler) => {
                tracing::trace!(target: targets::DISPATCH, kind = ?event.kind, ?target, ?handler, "pointer event handled");
                DispatchResult::Accepted(Some(handler))
            }
            None => DispatchResult::Ignored,
        }
    }

    /// Move hover to `target`, synthesizing leave and enter events.
    fn update_hover(&mut self, target: Option<ElementId>, event: &UcEvent) {
        let root = self.tree.root();
        let new_chain: Vec<ElementId> = match target {
            Some(t) => std::iter::once(t)
                .chain(self.tree.ancestors(t))
                .filter(|&id| id != root)
                .collect(),
            None => Vec::new(),
        };
        if new_chain == self.input.hover_chain {
            return;
        }
        let old_chain = std::mem::replace(&mut self.input.hover_chain, new_chain.clone());

        let mut synth = |kind: EventKind| {
            let mut e = event.clone();
            e.kind = kind;
            e
        };
        let leave = synth(EventKind::MouseLeave);
        let enter = synth(EventKind::MouseEnter);

        for &id in old_chain.iter().filter(|id| !new_chain.contains(id)) {
            if let Some(element) = self.tree.get_mut(id) {
                element.base_mut().set_hovered(false);
            }
            send_direct(self.tree, id, &leave, &mut self.env);
        }
        for &id in new_chain.iter().rev().filter(|id| !old_chain.contains(id)) {
            if let Some(element) = self.tree.get_mut(id) {
                element.base_mut().set_hovered(true);
            }
            send_direct(self.tree, id, &enter, &mut self.env);
        }

        self.input.cursor = new_chain
            .iter()
            .filter_map(|&id| self.tree.get(id))
            .map(|e| e.base().cursor())
            .find(|&c| c != CursorIcon::Default)
            .unwrap_or_default();
        tracing::trace!(target: targets::DISPATCH, hovered = ?new_chain.first(), cursor = ?self.input.cursor, "hover changed");
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    fn dispatch_keyboard(&mut self, event: &UcEvent) -> DispatchResult {
        self.popups.process_pending();

        if let Some(popup) = self.popups.topmost()
            && send_direct(self.tree, popup, event, &mut self.env)
        {
            return DispatchResult::Accepted(Some(popup));
        }

        if let Some(focused) = self.focus.focused()
            && self.tree.is_attached(focused)
            && let Some(handler) = bubble(self.tree, focused, event, &mut self.env)
        {
            return DispatchResult::Accepted(Some(handler));
        }

        if event.kind != EventKind::KeyDown {
            return DispatchResult::Ignored;
        }
        match event.virtual_key {
            VirtualKey::Escape => match self.popups.topmost() {
                Some(popup) => {
                    self.dismiss_popup(popup);
                    DispatchResult::Accepted(None)
                }
                None => DispatchResult::Ignored,
            },
            VirtualKey::Tab => {
                let moved = if event.shift() {
                    self.focus.focus_previous(self.tree, &mut self.env)
                } else {
                    self.focus.focus_next(self.tree, &mut self.env)
                };
                if moved {
                    DispatchResult::Accepted(None)
                } else {
                    DispatchResult::Ignored
                }
            }
            _ => DispatchResult::Ignored,
        }
    }

    fn dismiss_popup(&mut self, popup: ElementId) {
        let origin = self.tree.window_position(popup);
        if let Some(element) = self.tree.get_mut(popup) {
            let mut cx = EventCx::new(popup, origin, &mut self.env);
            element.dismiss_popup(&mut cx);
            tracing::debug!(target: targets::POPUP, ?popup, "popup dismissed by Escape");
        }
    }
}

/// Whether an element would receive pointer events at `point` (used by
/// tests and diagnostics).
pub fn target_at(tree: &ElementTree, point: IntPoint) -> Option<ElementId> {
    zorder::hit_test(tree, point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Request;
    use crate::element::{Container, ElementBase};
    use crate::event::Modifiers;
    use crate::id::WindowId;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<(String, EventKind, i32, i32)>>>;

    struct Probe {
        base: ElementBase,
        log: Log,
        handles: bool,
        container: bool,
    }

    impl Element for Probe {
        fn base(&self) -> &ElementBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ElementBase {
            &mut self.base
        }
        fn is_container(&self) -> bool {
            self.container
        }
        fn on_event(&mut self, _cx: &mut EventCx<'_>, event: &UcEvent) -> bool {
            self.log
                .lock()
                .push((self.base.identifier().to_string(), event.kind, event.x, event.y));
            self.handles
        }
    }

    struct Fixture {
        tree: ElementTree,
        popups: PopupRegistry,
        focus: FocusManager,
        input: InputState,
        requests: Vec<Request>,
        log: Log,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tree: ElementTree::new(400, 300),
                popups: PopupRegistry::new(),
                focus: FocusManager::new(),
                input: InputState::default(),
                requests: Vec::new(),
                log: Arc::default(),
            }
        }

        fn probe(&mut self, parent: Option<ElementId>, name: &str, rect: IntRect, handles: bool) -> ElementId {
            let probe = Probe {
                base: ElementBase::new(name, rect),
                log: Arc::clone(&self.log),
                handles,
                container: true,
            };
            let parent = parent.unwrap_or(self.tree.root());
            self.tree.add(parent, probe).unwrap()
        }

        fn dispatch(&mut self, event: UcEvent) -> DispatchResult {
            let capture = self.input.capture();
            let mut router = Router {
                tree: &mut self.tree,
                popups: &mut self.popups,
                focus: &mut self.focus,
                input: &mut self.input,
                env: DispatchEnv::new(WindowId::next(), 0, capture, &mut self.requests),
                bounds: IntRect::new(0, 0, 400, 300),
            };
            router.dispatch(&event)
        }

        fn names(&self) -> Vec<(String, EventKind)> {
            self.log.lock().iter().map(|(n, k, _, _)| (n.clone(), *k)).collect()
        }
    }

    #[test]
    fn test_hit_test_delivers_local_coordinates_and_bubbles() {
        let mut f = Fixture::new();
        let panel = f.probe(None, "panel", IntRect::new(10, 10, 100, 100), true);
        let button = f.probe(Some(panel), "button", IntRect::new(5, 5, 20, 20), false);

        let result = f.dispatch(UcEvent::mouse_down(20, 20));
        assert_eq!(result, DispatchResult::Accepted(Some(panel)));
        let log = f.log.lock().clone();
        assert_eq!(log[0], ("button".to_string(), EventKind::MouseDown, 5, 5));
        assert_eq!(log[1], ("panel".to_string(), EventKind::MouseDown, 10, 10));
        assert_eq!(target_at(&f.tree, IntPoint::new(20, 20)), Some(button));
    }

    #[test]
    fn test_outside_window_discarded() {
        let mut f = Fixture::new();
        f.probe(None, "all", IntRect::new(0, 0, 1000, 1000), true);
        assert_eq!(f.dispatch(UcEvent::mouse_down(450, 10)), DispatchResult::Discarded);
        assert_eq!(f.dispatch(UcEvent::mouse_down(-1, 10)), DispatchResult::Discarded);
        assert!(f.log.lock().is_empty());
    }

    #[test]
    fn test_empty_window_not_handled() {
        let mut f = Fixture::new();
        assert_eq!(f.dispatch(UcEvent::mouse_down(5, 5)), DispatchResult::Ignored);
    }

    #[test]
    fn test_capture_routes_exclusively() {
        let mut f = Fixture::new();
        let slider = f.probe(None, "slider", IntRect::new(0, 0, 50, 20), true);
        f.probe(None, "other", IntRect::new(100, 100, 50, 50), true);
        f.input.set_capture(Some(slider));

        f.dispatch(UcEvent::mouse(EventKind::MouseUp, 120, 120, crate::MouseButton::Left));
        let log = f.log.lock().clone();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0], ("slider".to_string(), EventKind::MouseUp, 120, 120));
    }

    #[test]
    fn test_mouse_up_outside_window_clears_capture() {
        let mut f = Fixture::new();
        let slider = f.probe(None, "slider", IntRect::new(0, 0, 50, 20), true);
        f.input.set_capture(Some(slider));
        f.dispatch(UcEvent::mouse_up(900, 900));
        assert_eq!(f.input.capture(), None);
    }

    #[test]
    fn test_hover_enter_and_leave_order() {
        let mut f = Fixture::new();
        let panel = f.probe(None, "panel", IntRect::new(0, 0, 100, 100), false);
        let inner = f.probe(Some(panel), "inner", IntRect::new(10, 10, 20, 20), false);
        let other = f.probe(None, "other", IntRect::new(200, 0, 50, 50), false);

        f.dispatch(UcEvent::mouse_move(15, 15));
        assert_eq!(f.input.hovered(), Some(inner));
        f.log.lock().clear();

        f.dispatch(UcEvent::mouse_move(210, 10));
        assert_eq!(f.input.hovered(), Some(other));
        assert_eq!(
            f.names(),
            vec![
                ("inner".to_string(), EventKind::MouseLeave),
                ("panel".to_string(), EventKind::MouseLeave),
                ("other".to_string(), EventKind::MouseEnter),
                ("other".to_string(), EventKind::MouseMove),
            ]
        );
        assert!(!f.tree.get(panel).unwrap().base().is_hovered());
        assert!(f.tree.get(other).unwrap().base().is_hovered());

        f.dispatch(UcEvent::new(EventKind::MouseLeave));
        assert_eq!(f.input.hovered(), None);
    }

    #[test]
    fn test_hover_resolves_cursor() {
        let mut f = Fixture::new();
        let panel = f.probe(None, "panel", IntRect::new(0, 0, 100, 100), false);
        f.probe(Some(panel), "inner", IntRect::new(10, 10, 20, 20), false);
        f.tree
            .get_mut(panel)
            .unwrap()
            .base_mut()
            .set_cursor(CursorIcon::Pointer);
        f.dispatch(UcEvent::mouse_move(15, 15));
        assert_eq!(f.input.cursor(), CursorIcon::Pointer);
        f.dispatch(UcEvent::mouse_move(300, 200));
        assert_eq!(f.input.cursor(), CursorIcon::Default);
    }

    #[test]
    fn test_disabled_element_skipped() {
        let mut f = Fixture::new();
        let panel = f.probe(None, "panel", IntRect::new(0, 0, 100, 100), true);
        let button = f.probe(Some(panel), "button", IntRect::new(0, 0, 10, 10), true);
        f.tree.set_enabled(button, false);
        assert_eq!(f.dispatch(UcEvent::mouse_down(5, 5)), DispatchResult::Accepted(Some(panel)));
    }

    #[test]
    fn test_keyboard_goes_to_focused_then_tab_moves_focus() {
        let mut f = Fixture::new();
        let a = f.probe(None, "a", IntRect::new(0, 0, 10, 10), false);
        let b = f.probe(None, "b", IntRect::new(0, 20, 10, 10), false);
        for id in [a, b] {
            f.tree.get_mut(id).unwrap().base_mut().set_accepts_focus(true);
        }

        assert_eq!(f.dispatch(UcEvent::key_down(VirtualKey::Tab)), DispatchResult::Accepted(None));
        assert_eq!(f.focus.focused(), Some(a));

        f.log.lock().clear();
        f.dispatch(UcEvent::key_down(VirtualKey::Tab).with_modifiers(Modifiers::SHIFT));
        assert_eq!(f.focus.focused(), Some(b));
        assert_eq!(f.names()[0], ("a".to_string(), EventKind::KeyDown));

        assert_eq!(f.dispatch(UcEvent::key_down(VirtualKey::Escape)), DispatchResult::Ignored);
    }

    #[test]
    fn test_escape_dismisses_topmost_popup() {
        let mut f = Fixture::new();
        let popup = f.probe(None, "menu", IntRect::new(0, 0, 50, 50), false);
        f.popups.add(popup);
        assert!(f.dispatch(UcEvent::key_down(VirtualKey::Escape)).was_handled());
        assert_eq!(f.requests, vec![Request::RemovePopup(popup)]);
    }

    #[test]
    fn test_outside_notification_only_for_presses() {
        struct Menu {
            base: ElementBase,
            outside: Arc<Mutex<u32>>,
        }
        impl Element for Menu {
            fn base(&self) -> &ElementBase {
                &self.base
            }
            fn base_mut(&mut self) -> &mut ElementBase {
                &mut self.base
            }
            fn on_outside_event(&mut self, cx: &mut EventCx<'_>, _event: &UcEvent) -> bool {
                *self.outside.lock() += 1;
                cx.remove_popup();
                true
            }
        }

        let mut f = Fixture::new();
        f.probe(None, "under", IntRect::new(0, 0, 400, 300), true);
        let outside = Arc::new(Mutex::new(0));
        let menu = f
            .tree
            .add(
                f.tree.root(),
                Menu {
                    base: ElementBase::new("menu", IntRect::new(0, 0, 50, 50)),
                    outside: Arc::clone(&outside),
                },
            )
            .unwrap();
        f.popups.add(menu);

        f.dispatch(UcEvent::mouse_move(200, 200));
        assert_eq!(*outside.lock(), 0);

        assert_eq!(f.dispatch(UcEvent::mouse_down(200, 200)), DispatchResult::Accepted(Some(menu)));
        assert_eq!(*outside.lock(), 1);
        assert!(!f.names().contains(&("under".to_string(), EventKind::MouseDown)));
    }

    #[test]
    fn test_container_without_children_not_handled() {
        let mut f = Fixture::new();
        f.tree.add(f.tree.root(), Container::new("empty", IntRect::new(0, 0, 50, 50))).unwrap();
        assert_eq!(f.dispatch(UcEvent::mouse_down(10, 10)), DispatchResult::Ignored);
    }
}
