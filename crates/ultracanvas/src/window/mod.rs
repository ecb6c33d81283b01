//! Top-level windows.
//!
//! A [`Window`] owns everything one native surface needs: the element tree,
//! focus, popups, pointer state, the tooltip and a double-buffered software
//! render context. The platform pushes normalized events through
//! [`Window::handle_event`]; the application loop then calls
//! [`Window::render`], which draws only when something asked for a redraw.
//!
//! # Requests
//!
//! Element handlers never touch the window directly. They queue requests
//! through their [`EventCx`](crate::EventCx) and the window applies them in
//! FIFO order after each delivery. Requests queued while applying (a focus
//! change that triggers `FocusLost`, which asks for a redraw) are applied in
//! later rounds of the same call.
//!
//! # Redraw
//!
//! Redraw requests coalesce: the first one since the last frame sets the
//! needs-redraw flag and pokes the native window, later ones do nothing.

mod config;
mod state;
mod window_type;

use std::sync::Arc;
use std::time::Duration;

use cursor_icon::CursorIcon;
use ultracanvas_core::logging::{span_names, targets};
use ultracanvas_core::{PerfSpan, SharedClock, Signal};
use ultracanvas_render::text::CosmicShaper;
use ultracanvas_render::{
    DoubleBuffer, DrawCommand, FixedAdvanceShaper, FrameStats, IntRect, RenderContext, RenderError,
    SoftwareDoubleBuffer, TextShaper,
};

use crate::context::{DispatchEnv, Request};
use crate::dispatch::{InputState, Router};
use crate::element::Element;
use crate::event::{EventKind, UcEvent};
use crate::focus::{FocusManager, FocusReason};
use crate::id::{ElementId, WindowId};
use crate::platform::NativeWindow;
use crate::popup::PopupRegistry;
use crate::tooltip::TooltipManager;
use crate::tree::{ElementTree, TreeError};
use crate::zorder;

pub use config::{TextShaping, WindowConfig};
pub use state::WindowState;
pub use window_type::WindowType;

/// Rounds of request processing per call before the queue is dropped.
const MAX_REQUEST_ROUNDS: usize = 64;

/// Errors from window operations.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("failed to create native window: {0}")]
    NativeCreation(String),
    #[error("{0} has been deleted")]
    Deleted(WindowId),
    #[error("invalid window state transition from {from} to {to}")]
    InvalidTransition { from: WindowState, to: WindowState },
    #[error(transparent)]
    Render(#[from] RenderError),
}

fn surface_dimension(v: i32) -> u32 {
    v.max(1) as u32
}

/// A top-level window.
pub struct Window {
    id: WindowId,
    config: WindowConfig,
    state: WindowState,
    created: bool,
    /// Whether the OS considers this window active.
    active: bool,
    needs_redraw: bool,
    tree: ElementTree,
    focus: FocusManager,
    popups: PopupRegistry,
    input: InputState,
    tooltip: TooltipManager,
    buffer: SoftwareDoubleBuffer,
    native: Option<Box<dyn NativeWindow>>,
    requests: Vec<Request>,
    clock: SharedClock,
    native_cursor: CursorIcon,
    frames_rendered: u64,
    last_frame: Option<FrameStats>,
    last_commands: Vec<DrawCommand>,

    on_close: Signal<WindowId>,
    on_resize: Signal<(i32, i32)>,
    on_move: Signal<(i32, i32)>,
    on_focus_changed: Signal<bool>,
    on_state_changed: Signal<WindowState>,
    on_notification: Signal<UcEvent>,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("title", &self.config.title())
            .field("state", &self.state)
            .field("needs_redraw", &self.needs_redraw)
            .field("elements", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Build a window around an already created native window.
    ///
    /// The render context is allocated at the configured size; failure
    /// leaves nothing behind.
    pub fn create(
        id: WindowId,
        config: WindowConfig,
        native: Box<dyn NativeWindow>,
        clock: SharedClock,
    ) -> Result<Self, WindowError> {
        let shaper: Arc<dyn TextShaper> = match config.text_shaping() {
            TextShaping::System => Arc::new(CosmicShaper::new()),
            TextShaping::Builtin => Arc::new(FixedAdvanceShaper),
        };
        let mut buffer = SoftwareDoubleBuffer::new(shaper);
        buffer.initialize(surface_dimension(config.width()), surface_dimension(config.height()))?;

        let mut tree = ElementTree::new(config.width(), config.height());
        tree.set_window(id);

        let state = if config.is_visible() {
            WindowState::Normal
        } else {
            WindowState::Hidden
        };
        let mut native = native;
        native.set_size_limits(config.min_size(), config.max_size());

        tracing::info!(
            target: targets::WINDOW,
            %id,
            title = config.title(),
            width = config.width(),
            height = config.height(),
            window_type = %config.window_type(),
            "window created"
        );

        Ok(Self {
            id,
            tooltip: TooltipManager::new(config.tooltip_style().clone()),
            config,
            state,
            created: true,
            active: false,
            needs_redraw: true,
            tree,
            focus: FocusManager::new(),
            popups: PopupRegistry::new(),
            input: InputState::default(),
            buffer,
            native: Some(native),
            requests: Vec::new(),
            clock,
            native_cursor: CursorIcon::Default,
            frames_rendered: 0,
            last_frame: None,
            last_commands: Vec::new(),
            on_close: Signal::new(),
            on_resize: Signal::new(),
            on_move: Signal::new(),
            on_focus_changed: Signal::new(),
            on_state_changed: Signal::new(),
            on_notification: Signal::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Whether the OS reports this window as focused.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// `(width, height)` from the configuration.
    pub fn size(&self) -> (i32, i32) {
        (self.config.width(), self.config.height())
    }

    /// Size of the render context's backing surface.
    pub fn surface_size(&self) -> (u32, u32) {
        self.buffer.size()
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Mutable access to the tree.
    ///
    /// Prefer [`add_element`](Self::add_element) and
    /// [`remove_element`](Self::remove_element), which keep focus, hover and
    /// popups consistent right away. Direct edits are reconciled at the next
    /// event or frame.
    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    pub fn root(&self) -> ElementId {
        self.tree.root()
    }

    pub fn focused_element(&self) -> Option<ElementId> {
        self.focus.focused()
    }

    /// Registered popups in registration order, excluding pending removals.
    pub fn active_popups(&self) -> Vec<ElementId> {
        self.popups.active()
    }

    pub fn captured_element(&self) -> Option<ElementId> {
        self.input.capture()
    }

    pub fn hovered_element(&self) -> Option<ElementId> {
        self.input.hovered()
    }

    /// Cursor resolved from the hovered elements.
    pub fn cursor(&self) -> CursorIcon {
        self.input.cursor()
    }

    pub fn tooltip(&self) -> &TooltipManager {
        &self.tooltip
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_frame_stats(&self) -> Option<FrameStats> {
        self.last_frame
    }

    /// Draw commands of the last rendered frame.
    pub fn last_commands(&self) -> &[DrawCommand] {
        &self.last_commands
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Emitted while the window closes, before it is hidden or deleted.
    pub fn on_close(&self) -> &Signal<WindowId> {
        &self.on_close
    }

    pub fn on_resize(&self) -> &Signal<(i32, i32)> {
        &self.on_resize
    }

    pub fn on_move(&self) -> &Signal<(i32, i32)> {
        &self.on_move
    }

    pub fn on_focus_changed(&self) -> &Signal<bool> {
        &self.on_focus_changed
    }

    pub fn on_state_changed(&self) -> &Signal<WindowState> {
        &self.on_state_changed
    }

    /// Semantic events emitted by elements, such as `DropdownSelect`.
    pub fn on_notification(&self) -> &Signal<UcEvent> {
        &self.on_notification
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    fn ensure_alive(&self) -> Result<(), WindowError> {
        if self.state == WindowState::Deleted {
            Err(WindowError::Deleted(self.id))
        } else {
            Ok(())
        }
    }

    fn set_state(&mut self, to: WindowState) -> Result<(), WindowError> {
        if self.state == to {
            return Ok(());
        }
        if !self.state.can_transition_to(to) {
            return Err(WindowError::InvalidTransition { from: self.state, to });
        }
        tracing::debug!(target: targets::WINDOW, id = %self.id, from = %self.state, to = %to, "window state changed");
        self.state = to;
        self.on_state_changed.emit(to);
        Ok(())
    }

    fn with_native(&mut self, f: impl FnOnce(&mut dyn NativeWindow)) {
        if let Some(native) = self.native.as_deref_mut() {
            f(native);
        }
    }

    pub fn show(&mut self) -> Result<(), WindowError> {
        self.ensure_alive()?;
        if self.state == WindowState::Hidden {
            self.set_state(WindowState::Normal)?;
        }
        self.config.set_visible(true);
        self.with_native(|n| n.set_visible(true));
        self.request_redraw();
        Ok(())
    }

    pub fn hide(&mut self) -> Result<(), WindowError> {
        self.ensure_alive()?;
        if self.state.is_shown() {
            self.set_state(WindowState::Hidden)?;
        }
        self.config.set_visible(false);
        self.tooltip.hide_immediately();
        self.input.set_capture(None);
        self.with_native(|n| n.set_visible(false));
        Ok(())
    }

    /// Close the window.
    ///
    /// The close signal fires while the window is still fully usable. With
    /// delete-on-close the window then moves to `DeleteRequested` and the
    /// application loop destroys it after the current dispatch; otherwise it
    /// is hidden. Focus requests are refused while closing.
    pub fn close(&mut self) -> Result<(), WindowError> {
        self.ensure_alive()?;
        if self.state.is_terminal() {
            return Ok(());
        }
        self.set_state(WindowState::Closing)?;
        self.focus.set_locked(true);
        self.tooltip.hide_immediately();
        self.on_close.emit(self.id);

        if self.config.delete_on_close() {
            self.set_state(WindowState::DeleteRequested)?;
        } else {
            self.set_state(WindowState::Hidden)?;
            self.focus.set_locked(false);
            self.config.set_visible(false);
            self.with_native(|n| n.set_visible(false));
        }
        Ok(())
    }

    /// Whether the application loop should destroy this window.
    pub fn is_delete_requested(&self) -> bool {
        self.state == WindowState::DeleteRequested
    }

    /// Free the native window and everything the window references.
    ///
    /// A handler must not call this on its own window; it should call
    /// [`close`](Self::close), which defers destruction to the loop.
    pub fn destroy(&mut self) {
        if self.state == WindowState::Deleted {
            return;
        }
        for step in [WindowState::Closing, WindowState::DeleteRequested, WindowState::Deleted] {
            if self.state.can_transition_to(step) {
                let _ = self.set_state(step);
            }
        }
        if let Some(focused) = self.focus.focused() {
            self.focus.forget(focused);
        }
        self.popups.clear();
        self.input = InputState::default();
        self.tooltip.hide_immediately();
        self.requests.clear();
        if let Some(mut native) = self.native.take() {
            native.close();
        }
        self.needs_redraw = false;
        tracing::info!(target: targets::WINDOW, id = %self.id, "window destroyed");
    }

    // =========================================================================
    // Geometry and decorations
    // =========================================================================

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), WindowError> {
        self.ensure_alive()?;
        let title = title.into();
        self.with_native(|n| n.set_title(&title));
        self.config.set_title(title);
        Ok(())
    }

    pub fn set_position(&mut self, x: i32, y: i32) -> Result<(), WindowError> {
        self.ensure_alive()?;
        self.config.set_position(x, y);
        self.with_native(|n| n.set_position(x, y));
        Ok(())
    }

    /// Resize, clamped to the configured min/max size.
    pub fn set_size(&mut self, width: i32, height: i32) -> Result<(), WindowError> {
        self.ensure_alive()?;
        let (width, height) = self.config.clamp_size(width, height);
        self.with_native(|n| n.set_size(width, height));
        self.apply_resize(width, height);
        Ok(())
    }

    pub fn minimize(&mut self) -> Result<(), WindowError> {
        self.ensure_alive()?;
        self.set_state(WindowState::Minimized)?;
        self.with_native(|n| n.set_minimized(true));
        Ok(())
    }

    pub fn maximize(&mut self) -> Result<(), WindowError> {
        self.ensure_alive()?;
        self.set_state(WindowState::Maximized)?;
        self.with_native(|n| n.set_maximized(true));
        Ok(())
    }

    /// Return to `Normal` from minimized, maximized, fullscreen or hidden.
    pub fn restore(&mut self) -> Result<(), WindowError> {
        self.ensure_alive()?;
        let from = self.state;
        self.set_state(WindowState::Normal)?;
        match from {
            WindowState::Minimized => self.with_native(|n| n.set_minimized(false)),
            WindowState::Maximized => self.with_native(|n| n.set_maximized(false)),
            WindowState::Fullscreen => self.with_native(|n| n.set_fullscreen(false)),
            WindowState::Hidden => {
                self.config.set_visible(true);
                self.with_native(|n| n.set_visible(true));
            }
            _ => {}
        }
        self.request_redraw();
        Ok(())
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), WindowError> {
        self.ensure_alive()?;
        let to = if fullscreen {
            WindowState::Fullscreen
        } else {
            WindowState::Normal
        };
        self.set_state(to)?;
        self.with_native(|n| n.set_fullscreen(fullscreen));
        Ok(())
    }

    pub fn set_resizable(&mut self, resizable: bool) -> Result<(), WindowError> {
        self.ensure_alive()?;
        self.config.set_resizable(resizable);
        self.with_native(|n| n.set_resizable(resizable));
        Ok(())
    }

    /// Resize the render context and the root, repaint everything.
    fn apply_resize(&mut self, width: i32, height: i32) {
        let surface = (surface_dimension(width), surface_dimension(height));
        if (width, height) == self.size() && self.buffer.size() == surface {
            return;
        }
        self.config.set_size(width, height);
        if let Err(err) = self.buffer.resize(surface.0, surface.1) {
            tracing::warn!(target: targets::RENDER, id = %self.id, width, height, %err, "render surface resize failed");
        }
        let root = self.tree.root();
        self.tree.set_bounds(root, IntRect::new(0, 0, width, height));
        self.tree.mark_all_dirty();
        tracing::debug!(target: targets::WINDOW, id = %self.id, width, height, "window resized");
        self.on_resize.emit((width, height));
        self.request_redraw();
    }

    // =========================================================================
    // Redraw
    // =========================================================================

    /// Schedule a repaint. Calls before the next frame coalesce.
    pub fn request_redraw(&mut self) {
        if self.needs_redraw || self.state == WindowState::Deleted {
            return;
        }
        self.needs_redraw = true;
        self.with_native(|n| n.request_redraw());
    }

    fn sync_dirty(&mut self) {
        if self.tree.take_dirty() {
            self.request_redraw();
        }
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Add an element under `parent`.
    pub fn add_element<E: Element>(&mut self, parent: ElementId, element: E) -> Result<ElementId, TreeError> {
        let id = self.tree.add(parent, element)?;
        self.request_redraw();
        Ok(id)
    }

    /// Detach an element and its subtree; it stays stored and can be
    /// re-added. Focus inside the subtree is cleared first.
    pub fn remove_element(&mut self, id: ElementId) -> Result<Vec<ElementId>, TreeError> {
        let parent = self.attached_parent(id)?;
        self.release_subtree(id);
        let removed = self.tree.remove_child(parent, id)?;
        self.process_requests();
        self.request_redraw();
        Ok(removed)
    }

    /// Remove and drop an element and its subtree. Focus inside the subtree
    /// is cleared first.
    pub fn destroy_element(&mut self, id: ElementId) -> Result<Vec<ElementId>, TreeError> {
        if id == self.tree.root() {
            return Err(TreeError::RootRemoval);
        }
        if !self.tree.contains(id) {
            return Err(TreeError::UnknownElement(id));
        }
        self.release_subtree(id);
        let removed = self.tree.destroy(id)?;
        self.process_requests();
        self.request_redraw();
        Ok(removed)
    }

    fn attached_parent(&self, id: ElementId) -> Result<ElementId, TreeError> {
        if id == self.tree.root() {
            return Err(TreeError::RootRemoval);
        }
        self.tree.parent(id).ok_or(TreeError::UnknownElement(id))
    }

    /// Drop window references into the subtree at `id`, sending `FocusLost`
    /// if it holds focus.
    fn release_subtree(&mut self, id: ElementId) {
        let subtree = self.tree.descendants(id);
        if let Some(focused) = self.focus.focused()
            && subtree.contains(&focused)
        {
            self.with_focus(|focus, tree, env| focus.clear_focus(tree, env));
        }
        for gone in subtree {
            self.popups.forget(gone);
            self.input.forget(gone);
        }
    }

    /// Forget elements that were detached through [`tree_mut`](Self::tree_mut).
    fn prune_detached(&mut self) {
        if let Some(focused) = self.focus.focused()
            && !self.tree.is_attached(focused)
        {
            self.focus.forget(focused);
            if let Some(element) = self.tree.get_mut(focused) {
                element.base_mut().set_focused(false);
            }
            tracing::debug!(target: targets::FOCUS, ?focused, "dropped focus of detached element");
        }
        for popup in self.popups.active() {
            if !self.tree.is_attached(popup) {
                self.popups.forget(popup);
            }
        }
        let stale: Vec<ElementId> = self
            .input
            .capture()
            .into_iter()
            .chain(self.input.hover_chain().iter().copied())
            .filter(|&id| !self.tree.is_attached(id))
            .collect();
        for id in stale {
            self.input.forget(id);
        }
    }

    // =========================================================================
    // Popups
    // =========================================================================

    /// Register an attached element as a popup.
    pub fn add_popup_element(&mut self, id: ElementId) -> bool {
        if !self.tree.is_attached(id) {
            tracing::debug!(target: targets::POPUP, ?id, "refusing popup for detached element");
            return false;
        }
        self.popups.add(id);
        self.request_redraw();
        true
    }

    /// Unregister a popup at the start of the next dispatch.
    pub fn remove_popup_element(&mut self, id: ElementId) {
        if self.popups.is_active(id) {
            self.popups.remove(id);
            self.request_redraw();
        }
    }

    // =========================================================================
    // Focus
    // =========================================================================

    fn timestamp(&self) -> u64 {
        self.clock.now_millis()
    }

    fn with_focus<R>(&mut self, f: impl FnOnce(&mut FocusManager, &mut ElementTree, &mut DispatchEnv<'_>) -> R) -> R {
        let timestamp = self.timestamp();
        let mut env = DispatchEnv::new(self.id, timestamp, self.input.capture(), &mut self.requests);
        f(&mut self.focus, &mut self.tree, &mut env)
    }

    /// Move focus without validation beyond attachment. `None` clears it.
    pub fn set_focused_element(&mut self, id: Option<ElementId>) -> bool {
        let ok = self.with_focus(|focus, tree, env| focus.set_focused_element(tree, id, FocusReason::Other, env));
        self.finish_operation();
        ok
    }

    pub fn clear_focus(&mut self) {
        self.with_focus(|focus, tree, env| focus.clear_focus(tree, env));
        self.finish_operation();
    }

    pub fn focus_next_element(&mut self) -> bool {
        let ok = self.with_focus(|focus, tree, env| focus.focus_next(tree, env));
        self.finish_operation();
        ok
    }

    pub fn focus_previous_element(&mut self) -> bool {
        let ok = self.with_focus(|focus, tree, env| focus.focus_previous(tree, env));
        self.finish_operation();
        ok
    }

    /// Validated focus request. Returns `false` and leaves focus unchanged
    /// when the element cannot take focus or the window is closing.
    pub fn request_element_focus(&mut self, id: ElementId) -> bool {
        let ok = self.with_focus(|focus, tree, env| focus.request_focus(tree, id, env));
        self.finish_operation();
        ok
    }

    // =========================================================================
    // Tooltip
    // =========================================================================

    /// Show a tooltip at a window-local position after the style's delay.
    pub fn show_tooltip(&mut self, text: impl Into<String>, x: i32, y: i32) {
        let now = self.clock.now();
        if self.tooltip.update_and_show(text, ultracanvas_render::IntPoint::new(x, y), now) {
            self.request_redraw();
        }
    }

    pub fn show_tooltip_immediately(&mut self, text: impl Into<String>, x: i32, y: i32) {
        if self.tooltip.show_immediately(text, ultracanvas_render::IntPoint::new(x, y)) {
            self.request_redraw();
        }
    }

    pub fn hide_tooltip(&mut self) {
        let now = self.clock.now();
        if self.tooltip.hide(now) {
            self.request_redraw();
        }
    }

    pub fn hide_tooltip_immediately(&mut self) {
        if self.tooltip.hide_immediately() {
            self.request_redraw();
        }
    }

    /// Advance time-based state. Returns whether a redraw was scheduled.
    pub fn tick(&mut self, now: Duration) -> bool {
        if self.tooltip.update(now) {
            self.request_redraw();
            return true;
        }
        false
    }

    /// The next instant [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.tooltip.next_deadline()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Feed one platform event to the window. Returns whether it was handled.
    pub fn handle_event(&mut self, event: UcEvent) -> bool {
        if self.state == WindowState::Deleted {
            return false;
        }
        let _span = PerfSpan::new(span_names::DISPATCH);
        let mut event = event;
        event.window.get_or_insert(self.id);

        self.prune_detached();
        let handled = if event.is_lifecycle() {
            self.handle_lifecycle(&event)
        } else if event.is_input() {
            self.dispatch_input(&event)
        } else if event.kind.is_semantic() {
            self.on_notification.emit(event);
            true
        } else {
            false
        };
        self.finish_operation();
        handled
    }

    fn dispatch_input(&mut self, event: &UcEvent) -> bool {
        if self.state.is_terminal() || !self.state.is_shown() {
            tracing::trace!(target: targets::DISPATCH, id = %self.id, kind = ?event.kind, state = %self.state, "input dropped");
            return false;
        }
        let capture = self.input.capture();
        let bounds = IntRect::new(0, 0, self.config.width(), self.config.height());
        let mut router = Router {
            tree: &mut self.tree,
            popups: &mut self.popups,
            focus: &mut self.focus,
            input: &mut self.input,
            env: DispatchEnv::new(self.id, event.timestamp, capture, &mut self.requests),
            bounds,
        };
        let result = router.dispatch(event);
        tracing::trace!(target: targets::DISPATCH, id = %self.id, kind = ?event.kind, ?result, "event dispatched");
        result.was_handled()
    }

    fn handle_lifecycle(&mut self, event: &UcEvent) -> bool {
        match event.kind {
            EventKind::WindowResize => self.apply_resize(event.width.max(0), event.height.max(0)),
            EventKind::WindowMove => {
                self.config.set_position(event.x, event.y);
                self.on_move.emit((event.x, event.y));
            }
            EventKind::WindowFocus => {
                self.active = true;
                self.on_focus_changed.emit(true);
            }
            EventKind::WindowBlur => {
                self.active = false;
                self.input.set_capture(None);
                self.tooltip.hide_immediately();
                self.on_focus_changed.emit(false);
                self.request_redraw();
            }
            EventKind::WindowShow => {
                if self.state == WindowState::Hidden {
                    let _ = self.set_state(WindowState::Normal);
                }
                self.config.set_visible(true);
                self.request_redraw();
            }
            EventKind::WindowHide => {
                if self.state.is_shown() {
                    let _ = self.set_state(WindowState::Hidden);
                }
                self.config.set_visible(false);
            }
            EventKind::WindowClose => {
                if !self.config.is_closable() {
                    return false;
                }
                if let Err(err) = self.close() {
                    tracing::warn!(target: targets::WINDOW, id = %self.id, %err, "close failed");
                }
            }
            EventKind::WindowExpose => {
                // The OS lost our pixels; repaint without another native request.
                self.needs_redraw = true;
            }
            _ => return false,
        }
        true
    }

    /// Apply queued requests, forward the cursor and pick up dirty state.
    fn finish_operation(&mut self) {
        self.process_requests();
        let cursor = self.input.cursor();
        if cursor != self.native_cursor {
            self.native_cursor = cursor;
            self.with_native(|n| n.set_cursor(cursor));
        }
        self.sync_dirty();
    }

    fn process_requests(&mut self) {
        let mut rounds = 0;
        while !self.requests.is_empty() {
            rounds += 1;
            if rounds > MAX_REQUEST_ROUNDS {
                tracing::warn!(
                    target: targets::WINDOW,
                    id = %self.id,
                    dropped = self.requests.len(),
                    "request processing did not settle, dropping the rest"
                );
                self.requests.clear();
                return;
            }
            for request in std::mem::take(&mut self.requests) {
                self.apply_request(request);
            }
        }
    }

    fn apply_request(&mut self, request: Request) {
        match request {
            Request::Redraw => self.request_redraw(),
            Request::CaptureMouse(id) => {
                if self.tree.is_attached(id) {
                    self.input.set_capture(Some(id));
                }
            }
            Request::ReleaseMouse(id) => {
                if self.input.capture() == Some(id) {
                    self.input.set_capture(None);
                }
            }
            Request::AddPopup(id) => {
                self.add_popup_element(id);
            }
            Request::RemovePopup(id) => self.remove_popup_element(id),
            Request::SetFocus(id) => {
                self.with_focus(|focus, tree, env| focus.request_focus(tree, id, env));
            }
            Request::ClearFocus => self.with_focus(|focus, tree, env| focus.clear_focus(tree, env)),
            Request::FocusNext => {
                self.with_focus(|focus, tree, env| focus.focus_next(tree, env));
            }
            Request::FocusPrevious => {
                self.with_focus(|focus, tree, env| focus.focus_previous(tree, env));
            }
            Request::Emit(event) => {
                tracing::debug!(target: targets::WINDOW, id = %self.id, kind = ?event.kind, target = ?event.target, user_data = event.user_data, "notification");
                self.on_notification.emit(event);
            }
            Request::ShowTooltip {
                text,
                position,
                immediate,
            } => {
                if immediate {
                    self.show_tooltip_immediately(text, position.x, position.y);
                } else {
                    self.show_tooltip(text, position.x, position.y);
                }
            }
            Request::HideTooltip { immediate } => {
                if immediate {
                    self.hide_tooltip_immediately();
                } else {
                    self.hide_tooltip();
                }
            }
            Request::CloseWindow => {
                if let Err(err) = self.close() {
                    tracing::warn!(target: targets::WINDOW, id = %self.id, %err, "close request failed");
                }
            }
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Draw a frame if one was requested and present it.
    ///
    /// Returns whether a frame was rendered.
    pub fn render(&mut self) -> bool {
        if self.state == WindowState::Deleted || self.native.is_none() {
            return false;
        }
        self.prune_detached();
        self.sync_dirty();
        if !self.needs_redraw || !self.state.is_shown() {
            return false;
        }
        let _span = PerfSpan::new(span_names::FRAME);

        let window_rect = IntRect::new(0, 0, self.config.width(), self.config.height());
        let Some(ctx) = self.buffer.staging_context() else {
            tracing::warn!(target: targets::RENDER, id = %self.id, "no render context");
            return false;
        };
        ctx.begin_frame();
        ctx.clear(self.config.background());

        let depth = ctx.state_depth();
        render_element(&self.tree, self.tree.root(), ctx);
        for popup in self.popups.active() {
            render_popup(&self.tree, popup, ctx, window_rect);
        }
        self.tooltip.render(ctx, window_rect);
        if ctx.state_depth() != depth {
            tracing::warn!(target: targets::RENDER, id = %self.id, "frame left the state stack unbalanced");
            ctx.restore_state_depth(depth);
        }

        let stats = ctx.end_frame();
        self.last_commands = ctx.recorded_commands().to_vec();

        if let Err(err) = self.buffer.swap() {
            tracing::warn!(target: targets::RENDER, id = %self.id, %err, "swap failed");
        } else if let (Some(native), Some(frame)) = (self.native.as_deref_mut(), self.buffer.front_buffer())
            && let Err(err) = native.present(&frame)
        {
            tracing::warn!(target: targets::PLATFORM, %err, "present failed");
        }

        self.needs_redraw = false;
        self.frames_rendered += 1;
        self.last_frame = Some(stats);
        tracing::trace!(target: targets::RENDER, id = %self.id, frame = self.frames_rendered, fills = stats.fills, texts = stats.texts, "frame rendered");
        true
    }
}

/// Render `id` and its visible subtree in z-order.
fn render_element(tree: &ElementTree, id: ElementId, ctx: &mut dyn RenderContext) {
    let Some(element) = tree.get(id) else {
        return;
    };
    let base = element.base();
    if !base.is_visible() {
        return;
    }
    let bounds = base.bounds();

    ctx.push_state();
    ctx.translate(bounds.x as f32, bounds.y as f32);
    let depth = ctx.state_depth();
    element.render(ctx);
    if ctx.state_depth() != depth {
        tracing::warn!(target: targets::RENDER, element = base.identifier(), "unbalanced push/pop in render");
        ctx.restore_state_depth(depth);
    }

    let children = zorder::sorted_children(tree, id);
    if !children.is_empty() {
        if base.clips_children() {
            ctx.clip_rect(0.0, 0.0, bounds.width as f32, bounds.height as f32);
        }
        let scroll = base.scroll_offset();
        ctx.translate(-scroll.x as f32, -scroll.y as f32);
        for child in children {
            render_element(tree, child, ctx);
        }
    }
    ctx.pop_state();
}

/// Render a popup's floating part above the tree, clipped to the window.
fn render_popup(tree: &ElementTree, id: ElementId, ctx: &mut dyn RenderContext, window: IntRect) {
    if !tree.is_effectively_visible(id) {
        return;
    }
    let Some(element) = tree.get(id) else {
        return;
    };
    let origin = tree.window_position(id);

    ctx.push_state();
    ctx.set_clip_rect(
        window.x as f32,
        window.y as f32,
        window.width as f32,
        window.height as f32,
    );
    ctx.translate(origin.x as f32, origin.y as f32);
    let depth = ctx.state_depth();
    element.render_popup(ctx);
    if ctx.state_depth() != depth {
        tracing::warn!(target: targets::RENDER, element = element.base().identifier(), "unbalanced push/pop in popup render");
        ctx.restore_state_depth(depth);
    }
    ctx.pop_state();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Container;
    use crate::platform::{HeadlessHandle, HeadlessWindow, NativeCall};
    use ultracanvas_core::ManualClock;
    use ultracanvas_render::Color;

    fn window(config: WindowConfig) -> (Window, HeadlessHandle, Arc<ManualClock>) {
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
        .unwrap();
        (window, handle, clock)
    }

    #[test]
    fn test_first_frame_renders_once() {
        let (mut w, handle, _) = window(WindowConfig::new("t").with_size(100, 80));
        assert!(w.render());
        assert!(!w.render());
        assert_eq!(handle.present_count(), 1);
        assert_eq!(w.frames_rendered(), 1);
        assert!(matches!(w.last_commands().first(), Some(DrawCommand::Clear(_))));
    }

    #[test]
    fn test_redraw_requests_coalesce() {
        let (mut w, handle, _) = window(WindowConfig::new("t").with_size(100, 80));
        w.render();
        handle.take_calls();
        w.request_redraw();
        w.request_redraw();
        w.request_redraw();
        let pokes = handle
            .calls()
            .iter()
            .filter(|c| matches!(c, NativeCall::RequestRedraw(_)))
            .count();
        assert_eq!(pokes, 1);
        assert!(w.render());
        assert!(!w.needs_redraw());
    }

    #[test]
    fn test_set_size_clamps() {
        let (mut w, _, _) = window(
            WindowConfig::new("t")
                .with_size(400, 300)
                .with_min_size(200, 100)
                .with_max_size(800, 600),
        );
        w.set_size(1000, 50).unwrap();
        assert_eq!(w.size(), (800, 100));
        assert_eq!(w.surface_size(), (800, 100));
        assert_eq!(w.tree().get(w.root()).unwrap().base().bounds(), IntRect::new(0, 0, 800, 100));
    }

    #[test]
    fn test_close_with_delete_requests_deletion() {
        let (mut w, _, _) = window(WindowConfig::new("t"));
        let closed = Arc::new(parking_lot::Mutex::new(None));
        let seen = Arc::clone(&closed);
        w.on_close().connect(move |id| *seen.lock() = Some(*id));
        w.close().unwrap();
        assert_eq!(*closed.lock(), Some(w.id()));
        assert!(w.is_delete_requested());
        w.destroy();
        assert_eq!(w.state(), WindowState::Deleted);
        assert!(matches!(w.show(), Err(WindowError::Deleted(_))));
        assert!(!w.render());
    }

    #[test]
    fn test_close_without_delete_hides() {
        let (mut w, _, _) = window(WindowConfig::new("t").with_delete_on_close(false));
        w.close().unwrap();
        assert_eq!(w.state(), WindowState::Hidden);
        assert!(!w.focus.is_locked());
        w.show().unwrap();
        assert_eq!(w.state(), WindowState::Normal);
    }

    #[test]
    fn test_invalid_transition_reported() {
        let (mut w, _, _) = window(WindowConfig::new("t"));
        w.hide().unwrap();
        assert!(matches!(w.maximize(), Err(WindowError::InvalidTransition { .. })));
        w.restore().unwrap();
        w.maximize().unwrap();
        w.restore().unwrap();
        assert_eq!(w.state(), WindowState::Normal);
    }

    #[test]
    fn test_input_outside_window_discarded() {
        let (mut w, _, _) = window(WindowConfig::new("t").with_size(100, 100));
        let root = w.root();
        w.add_element(root, Container::new("c", IntRect::new(0, 0, 500, 500)))
            .unwrap();
        assert!(!w.handle_event(UcEvent::mouse_down(150, 10)));
    }

    #[test]
    fn test_unbalanced_render_is_repaired() {
        struct Leaky(crate::ElementBase);
        impl Element for Leaky {
            fn base(&self) -> &crate::ElementBase {
                &self.0
            }
            fn base_mut(&mut self) -> &mut crate::ElementBase {
                &mut self.0
            }
            fn render(&self, ctx: &mut dyn RenderContext) {
                ctx.push_state();
                ctx.translate(5.0, 5.0);
            }
        }

        let (mut w, _, _) = window(WindowConfig::new("t").with_size(50, 50).with_background(Color::BLACK));
        let root = w.root();
        w.add_element(root, Leaky(crate::ElementBase::new("leaky", IntRect::new(0, 0, 10, 10))))
            .unwrap();
        w.add_element(
            root,
            Container::new("after", IntRect::new(20, 20, 10, 10)).with_background(Color::RED),
        )
        .unwrap();
        assert!(w.render());
        let fill = w.last_commands().iter().find_map(|c| match c {
            DrawCommand::FillPath { bounds, .. } => Some(*bounds),
            _ => None,
        });
        assert_eq!(fill.map(|b| (b.left(), b.top())), Some((20.0, 20.0)));
    }

    #[test]
    fn test_removing_focused_element_sends_focus_lost_first() {
        let (mut w, _, _) = window(WindowConfig::new("t"));
        let root = w.root();
        let panel = w.add_element(root, Container::new("panel", IntRect::new(0, 0, 50, 50))).unwrap();
        let mut field = Container::new("field", IntRect::new(0, 0, 10, 10));
        field.base_mut().set_accepts_focus(true);
        let field = w.add_element(panel, field).unwrap();
        assert!(w.request_element_focus(field));

        w.remove_element(panel).unwrap();
        assert_eq!(w.focused_element(), None);
        assert!(!w.tree().get(field).unwrap().base().is_focused());
    }
}
