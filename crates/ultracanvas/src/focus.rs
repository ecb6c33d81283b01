//! Keyboard focus for one window.
//!
//! [`FocusManager`] tracks the single focused element of a window and keeps
//! the per-element focused flag in sync with it.
//!
//! # Focus Change Events
//!
//! When focus moves, the manager:
//! 1. Clears the old element's flag and delivers `FocusLost` to it
//! 2. Records the new element
//! 3. Sets the new element's flag and delivers `FocusGained` to it
//!
//! Both events go straight to their element without bubbling. Requests the
//! handlers queue are applied by the window afterwards, so focus handlers
//! never re-enter the manager.
//!
//! # Tab Order
//!
//! Tab order is a depth-first pre-order walk of the window tree with
//! siblings in render order (ascending z, insertion order on ties). Hidden
//! subtrees are skipped. Only visible, enabled elements that accept focus
//! and are tab stops take part.

use ultracanvas_core::logging::targets;

use crate::context::DispatchEnv;
use crate::dispatch;
use crate::event::{EventKind, UcEvent};
use crate::id::ElementId;
use crate::tree::ElementTree;
use crate::zorder;

/// Why focus moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusReason {
    /// Tab key.
    Tab,
    /// Shift+Tab.
    Backtab,
    /// Requested by code.
    #[default]
    Other,
}

/// Tracks and moves keyboard focus within one window.
#[derive(Debug, Default)]
pub struct FocusManager {
    focused: Option<ElementId>,
    locked: bool,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    #[inline]
    pub fn has_focus(&self, id: ElementId) -> bool {
        self.focused == Some(id)
    }

    /// While locked, [`request_focus`](Self::request_focus) is denied.
    /// Windows lock focus while they close.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Move focus to `target`, or clear it with `None`.
    ///
    /// No-op when `target` already has focus. The target must be attached
    /// to the tree; a detached element is refused and focus is unchanged.
    ///
    /// # Returns
    ///
    /// `true` if `target` holds focus afterwards.
    pub(crate) fn set_focused_element(
        &mut self,
        tree: &mut ElementTree,
        target: Option<ElementId>,
        reason: FocusReason,
        env: &mut DispatchEnv<'_>,
    ) -> bool {
        if self.focused == target {
            return true;
        }
        if let Some(id) = target
            && !tree.is_attached(id)
        {
            tracing::debug!(target: targets::FOCUS, ?id, "refusing focus for detached element");
            return false;
        }

        if let Some(old) = self.focused.take() {
            Self::unfocus_element(tree, old, env);
        }
        self.focused = target;
        if let Some(new) = target {
            Self::focus_element(tree, new, env);
        }
        tracing::debug!(target: targets::FOCUS, focused = ?target, ?reason, "focus changed");
        true
    }

    /// Validated focus request.
    ///
    /// Denied while locked, or when the element is detached, hidden,
    /// disabled or does not accept focus.
    pub(crate) fn request_focus(&mut self, tree: &mut ElementTree, id: ElementId, env: &mut DispatchEnv<'_>) -> bool {
        if self.locked {
            tracing::debug!(target: targets::FOCUS, ?id, "focus request denied: locked");
            return false;
        }
        if !Self::is_focusable(tree, id) {
            tracing::debug!(target: targets::FOCUS, ?id, "focus request denied: not focusable");
            return false;
        }
        self.set_focused_element(tree, Some(id), FocusReason::Other, env)
    }

    pub(crate) fn clear_focus(&mut self, tree: &mut ElementTree, env: &mut DispatchEnv<'_>) {
        self.set_focused_element(tree, None, FocusReason::Other, env);
    }

    /// Move focus forward in tab order, wrapping at the end.
    ///
    /// With nothing focused, the first element in tab order gets focus.
    ///
    /// # Returns
    ///
    /// `true` if an element holds focus afterwards.
    pub(crate) fn focus_next(&mut self, tree: &mut ElementTree, env: &mut DispatchEnv<'_>) -> bool {
        let order = Self::tab_order(tree);
        let Some(&first) = order.first() else {
            return false;
        };
        let next = self
            .focused
            .and_then(|current| order.iter().position(|&id| id == current))
            .map(|pos| order[(pos + 1) % order.len()])
            .unwrap_or(first);
        self.set_focused_element(tree, Some(next), FocusReason::Tab, env)
    }

    /// Move focus backward in tab order, wrapping at the start.
    pub(crate) fn focus_previous(&mut self, tree: &mut ElementTree, env: &mut DispatchEnv<'_>) -> bool {
        let order = Self::tab_order(tree);
        let Some(&last) = order.last() else {
            return false;
        };
        let prev = self
            .focused
            .and_then(|current| order.iter().position(|&id| id == current))
            .map(|pos| order[(pos + order.len() - 1) % order.len()])
            .unwrap_or(last);
        self.set_focused_element(tree, Some(prev), FocusReason::Backtab, env)
    }

    /// Drop the focused element without notifying it; used when it no
    /// longer exists.
    pub(crate) fn forget(&mut self, id: ElementId) -> bool {
        if self.focused == Some(id) {
            self.focused = None;
            true
        } else {
            false
        }
    }

    /// Focusable elements of the tree in tab order.
    pub fn tab_order(tree: &ElementTree) -> Vec<ElementId> {
        let mut order = Vec::new();
        Self::collect_tab_order(tree, tree.root(), &mut order);
        order
    }

    fn collect_tab_order(tree: &ElementTree, id: ElementId, order: &mut Vec<ElementId>) {
        let Some(element) = tree.get(id) else {
            return;
        };
        let base = element.base();
        // Skip hidden elements and their children
        if !base.is_visible() {
            return;
        }
        if base.can_focus() && base.is_tab_stop() {
            order.push(id);
        }
        for child in zorder::sorted_children(tree, id) {
            Self::collect_tab_order(tree, child, order);
        }
    }

    fn is_focusable(tree: &ElementTree, id: ElementId) -> bool {
        tree.is_attached(id)
            && tree.is_effectively_visible(id)
            && tree.get(id).is_some_and(|e| e.base().can_focus())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn unfocus_element(tree: &mut ElementTree, id: ElementId, env: &mut DispatchEnv<'_>) {
        if let Some(element) = tree.get_mut(id) {
            element.base_mut().set_focused(false);
        }
        let mut event = UcEvent::new(EventKind::FocusLost).with_window(env.window).with_timestamp(env.timestamp);
        event.target = Some(id);
        dispatch::send_direct(tree, id, &event, env);
    }

    fn focus_element(tree: &mut ElementTree, id: ElementId, env: &mut DispatchEnv<'_>) {
        if let Some(element) = tree.get_mut(id) {
            element.base_mut().set_focused(true);
        }
        let mut event = UcEvent::new(EventKind::FocusGained).with_window(env.window).with_timestamp(env.timestamp);
        event.target = Some(id);
        dispatch::send_direct(tree, id, &event, env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EventCx, Request};
    use crate::element::{Container, Element, ElementBase};
    use crate::id::WindowId;
    use std::sync::Arc;
    use parking_lot::Mutex;
    use ultracanvas_render::IntRect;

    type Log = Arc<Mutex<Vec<(String, EventKind)>>>;

    struct Field {
        base: ElementBase,
        log: Log,
    }

    impl Element for Field {
        fn base(&self) -> &ElementBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ElementBase {
            &mut self.base
        }
        fn on_event(&mut self, _cx: &mut EventCx<'_>, event: &UcEvent) -> bool {
            self.log.lock().push((self.base.identifier().to_string(), event.kind));
            true
        }
    }

    fn setup(names: &[&str]) -> (ElementTree, Vec<ElementId>, Log) {
        let log: Log = Arc::default();
        let mut tree = ElementTree::new(200, 200);
        let root = tree.root();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let field = Field {
                    base: ElementBase::new(*name, IntRect::new(0, i as i32 * 20, 50, 20)).focusable(),
                    log: Arc::clone(&log),
                };
                tree.add(root, field).unwrap()
            })
            .collect();
        (tree, ids, log)
    }

    fn with_env<R>(f: impl FnOnce(&mut DispatchEnv<'_>) -> R) -> (R, Vec<Request>) {
        let mut requests = Vec::new();
        let mut env = DispatchEnv::new(WindowId::next(), 0, None, &mut requests);
        let out = f(&mut env);
        (out, requests)
    }

    #[test]
    fn test_set_focus_sends_events_in_order() {
        let (mut tree, ids, log) = setup(&["a", "b"]);
        let mut focus = FocusManager::new();
        with_env(|env| {
            assert!(focus.request_focus(&mut tree, ids[0], env));
            assert!(focus.request_focus(&mut tree, ids[1], env));
            // Re-focusing is a no-op.
            assert!(focus.request_focus(&mut tree, ids[1], env));
        });

        assert_eq!(
            *log.lock(),
            vec![
                ("a".to_string(), EventKind::FocusGained),
                ("a".to_string(), EventKind::FocusLost),
                ("b".to_string(), EventKind::FocusGained),
            ]
        );
        assert!(!tree.get(ids[0]).unwrap().base().is_focused());
        assert!(tree.get(ids[1]).unwrap().base().is_focused());
    }

    #[test]
    fn test_focus_next_wraps() {
        let (mut tree, ids, _) = setup(&["a", "b", "c"]);
        let mut focus = FocusManager::new();
        with_env(|env| {
            assert!(focus.focus_next(&mut tree, env));
            assert_eq!(focus.focused(), Some(ids[0]));
            focus.request_focus(&mut tree, ids[2], env);
            focus.focus_next(&mut tree, env);
            assert_eq!(focus.focused(), Some(ids[0]));
            focus.focus_previous(&mut tree, env);
            assert_eq!(focus.focused(), Some(ids[2]));
        });
    }

    #[test]
    fn test_tab_order_skips_hidden_subtrees_and_disabled() {
        let (mut tree, ids, _) = setup(&["a", "b", "c"]);
        let root = tree.root();
        let hidden = tree.add(root, Container::new("hidden", IntRect::ZERO)).unwrap();
        let inner = tree
            .add(
                hidden,
                Field {
                    base: ElementBase::new("inner", IntRect::ZERO).focusable(),
                    log: Arc::default(),
                },
            )
            .unwrap();
        tree.set_visible(hidden, false);
        tree.set_enabled(ids[1], false);

        let order = FocusManager::tab_order(&tree);
        assert_eq!(order, vec![ids[0], ids[2]]);
        assert!(!order.contains(&inner));
    }

    #[test]
    fn test_tab_order_follows_z() {
        let (mut tree, ids, _) = setup(&["a", "b"]);
        tree.set_z_index(ids[0], 10);
        assert_eq!(FocusManager::tab_order(&tree), vec![ids[1], ids[0]]);
    }

    #[test]
    fn test_request_denied_when_locked_or_unfocusable() {
        let (mut tree, ids, log) = setup(&["a", "b"]);
        let mut focus = FocusManager::new();
        focus.set_locked(true);
        with_env(|env| assert!(!focus.request_focus(&mut tree, ids[0], env)));
        focus.set_locked(false);

        tree.set_visible(ids[1], false);
        with_env(|env| assert!(!focus.request_focus(&mut tree, ids[1], env)));
        assert_eq!(focus.focused(), None);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_detached_element_refused() {
        let (mut tree, ids, _) = setup(&["a"]);
        let root = tree.root();
        tree.remove_child(root, ids[0]).unwrap();
        let mut focus = FocusManager::new();
        with_env(|env| assert!(!focus.set_focused_element(&mut tree, Some(ids[0]), FocusReason::Other, env)));
        assert_eq!(focus.focused(), None);
    }
}
