//! Element storage and the parent/child graph.
//!
//! An [`ElementTree`] owns every element of one window in a generational
//! arena. Parent and child links are IDs rather than pointers, so there are
//! no ownership cycles and a stale ID simply fails to resolve.
//!
//! Elements are inserted detached and become live once linked under the
//! root. An element's window is derived from attachment: a node reachable
//! from the root belongs to the tree's window, a detached node to none. A
//! child therefore always shares its parent's window.

use std::any::Any;

use ultracanvas_core::{TreeFormatOptions, TreeFormatter};
use ultracanvas_render::{IntPoint, IntRect};

use crate::element::{Container, Element};
use crate::id::{ElementId, WindowId};
use crate::zorder;

/// Errors from structural tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("element {0:?} does not exist")]
    UnknownElement(ElementId),
    #[error("element {0:?} cannot hold children")]
    NotAContainer(ElementId),
    #[error("element {0:?} already has a parent")]
    AlreadyParented(ElementId),
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: ElementId, child: ElementId },
    #[error("the root element cannot be removed")]
    RootRemoval,
    #[error("element {child:?} is not a child of {parent:?}")]
    NotAChild { parent: ElementId, child: ElementId },
}

struct Node {
    element: Box<dyn Element>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// Arena of elements rooted at a window's root container.
pub struct ElementTree {
    nodes: slotmap::SlotMap<ElementId, Node>,
    root: ElementId,
    window: Option<WindowId>,
    structure_changed: bool,
}

impl std::fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementTree")
            .field("len", &self.nodes.len())
            .field("root", &self.root)
            .field("window", &self.window)
            .finish()
    }
}

impl ElementTree {
    /// A tree whose root container covers `width` x `height`.
    pub fn new(width: i32, height: i32) -> Self {
        let mut nodes = slotmap::SlotMap::with_key();
        let root = nodes.insert(Node {
            element: Box::new(Container::new("root", IntRect::new(0, 0, width, height))),
            parent: None,
            children: Vec::new(),
        });
        Self {
            nodes,
            root,
            window: None,
            structure_changed: true,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// The window this tree belongs to.
    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub(crate) fn set_window(&mut self, window: WindowId) {
        self.window = Some(window);
    }

    /// Number of stored elements, attached or not, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    // =========================================================================
    // Insertion and Structure
    // =========================================================================

    /// Store an element without attaching it.
    pub fn insert<E: Element>(&mut self, element: E) -> ElementId {
        self.insert_boxed(Box::new(element))
    }

    pub fn insert_boxed(&mut self, element: Box<dyn Element>) -> ElementId {
        self.nodes.insert(Node {
            element,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Store an element and append it to `parent`.
    pub fn add<E: Element>(&mut self, parent: ElementId, element: E) -> Result<ElementId, TreeError> {
        let id = self.insert(element);
        if let Err(err) = self.add_child(parent, id) {
            self.nodes.remove(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Append a detached element to `parent`'s children.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.check_link(parent, child)?;
        if self.nodes[child].parent.is_some() {
            return Err(TreeError::AlreadyParented(child));
        }
        self.link(parent, child);
        Ok(())
    }

    /// Append `child` to `parent`, detaching it from any current parent.
    pub fn add_or_move_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.check_link(parent, child)?;
        if self.nodes[child].parent == Some(parent) {
            return Ok(());
        }
        self.detach(child);
        self.link(parent, child);
        Ok(())
    }

    /// Unlink `child` from `parent`. The child stays stored and can be
    /// re-added. Returns the IDs of the detached subtree.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<Vec<ElementId>, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownElement(parent));
        }
        if self.parent(child) != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(self.descendants(child))
    }

    /// Unlink and drop an element with its whole subtree.
    ///
    /// Returns the removed IDs, `child` first.
    pub fn destroy(&mut self, id: ElementId) -> Result<Vec<ElementId>, TreeError> {
        if id == self.root {
            return Err(TreeError::RootRemoval);
        }
        if !self.contains(id) {
            return Err(TreeError::UnknownElement(id));
        }
        self.detach(id);
        let removed = self.descendants(id);
        for &gone in &removed {
            self.nodes.remove(gone);
        }
        Ok(removed)
    }

    fn check_link(&self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        let node = self.nodes.get(parent).ok_or(TreeError::UnknownElement(parent))?;
        if !self.contains(child) {
            return Err(TreeError::UnknownElement(child));
        }
        if !node.element.is_container() {
            return Err(TreeError::NotAContainer(parent));
        }
        if child == self.root || parent == child || self.ancestors(parent).contains(&child) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    fn link(&mut self, parent: ElementId, child: ElementId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.nodes[child].element.base_mut().mark_dirty();
        self.structure_changed = true;
    }

    fn detach(&mut self, child: ElementId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        self.structure_changed = true;
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn get(&self, id: ElementId) -> Option<&dyn Element> {
        self.nodes.get(id).map(|n| n.element.as_ref())
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut (dyn Element + 'static)> {
        self.nodes.get_mut(id).map(|n| n.element.as_mut())
    }

    /// Borrow an element as its concrete type.
    pub fn downcast<T: Element>(&self, id: ElementId) -> Option<&T> {
        let element: &(dyn Any + 'static) = self.nodes.get(id)?.element.as_ref();
        element.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Element>(&mut self, id: ElementId) -> Option<&mut T> {
        let element: &mut (dyn Any + 'static) = self.nodes.get_mut(id)?.element.as_mut();
        element.downcast_mut::<T>()
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(id)?.parent
    }

    /// Children in insertion order.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent chain from the immediate parent up to the top.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            chain.push(p);
            current = self.parent(p);
        }
        chain
    }

    /// `id` and everything below it, depth-first pre-order.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(next) else {
                continue;
            };
            out.push(next);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Recursive search below `start` for an element by identifier.
    pub fn find_by_identifier(&self, start: ElementId, identifier: &str) -> Option<ElementId> {
        self.descendants(start)
            .into_iter()
            .find(|&id| self.get(id).is_some_and(|e| e.base().identifier() == identifier))
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: ElementId) -> bool {
        if id == self.root {
            return true;
        }
        self.contains(id) && self.ancestors(id).last() == Some(&self.root)
    }

    /// The window `id` belongs to: the tree's window when attached.
    pub fn element_window(&self, id: ElementId) -> Option<WindowId> {
        if self.is_attached(id) { self.window } else { None }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Position of the element's origin relative to its top-most ancestor,
    /// which for attached elements is the window.
    pub fn window_position(&self, id: ElementId) -> IntPoint {
        let Some(element) = self.get(id) else {
            return IntPoint::ZERO;
        };
        let mut pos = element.base().position();
        for ancestor in self.ancestors(id) {
            if let Some(a) = self.get(ancestor) {
                pos = pos + a.base().position() - a.base().scroll_offset();
            }
        }
        pos
    }

    /// Bounds in window coordinates.
    pub fn window_rect(&self, id: ElementId) -> IntRect {
        let size = self.get(id).map(|e| e.base().bounds()).unwrap_or_default();
        let origin = self.window_position(id);
        IntRect::new(origin.x, origin.y, size.width, size.height)
    }

    /// Window bounds intersected with every clipping ancestor.
    pub fn visible_rect(&self, id: ElementId) -> Option<IntRect> {
        let mut rect = self.window_rect(id);
        for ancestor in self.ancestors(id) {
            let clips = self.get(ancestor).is_some_and(|a| a.base().clips_children());
            if clips {
                rect = rect.intersect(&self.window_rect(ancestor))?;
            }
        }
        (!rect.is_empty()).then_some(rect)
    }

    /// Visible here and in every ancestor.
    pub fn is_effectively_visible(&self, id: ElementId) -> bool {
        let visible = |e: ElementId| self.get(e).is_some_and(|el| el.base().is_visible());
        visible(id) && self.ancestors(id).into_iter().all(visible)
    }

    /// Whether a window-local point lies in the element's visible area.
    pub fn contains_point(&self, id: ElementId, point: IntPoint) -> bool {
        if !self.is_effectively_visible(id) {
            return false;
        }
        let Some(visible) = self.visible_rect(id) else {
            return false;
        };
        if !visible.contains(point) {
            return false;
        }
        let local = point - self.window_position(id);
        self.get(id).is_some_and(|e| e.contains_local(local))
    }

    // =========================================================================
    // Mutation Helpers
    // =========================================================================

    pub fn set_bounds(&mut self, id: ElementId, bounds: IntRect) -> bool {
        self.with_base(id, |b| b.set_bounds(bounds))
    }

    pub fn set_z_index(&mut self, id: ElementId, z: i32) -> bool {
        self.with_base(id, |b| b.set_z_index(z))
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> bool {
        self.with_base(id, |b| b.set_visible(visible))
    }

    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) -> bool {
        self.with_base(id, |b| b.set_enabled(enabled))
    }

    fn with_base(&mut self, id: ElementId, f: impl FnOnce(&mut crate::ElementBase)) -> bool {
        match self.get_mut(id) {
            Some(element) => {
                f(element.base_mut());
                true
            }
            None => false,
        }
    }

    /// Collect and clear dirty flags. Returns whether anything attached
    /// changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        let mut dirty = std::mem::take(&mut self.structure_changed);
        for node in self.nodes.values_mut() {
            dirty |= node.element.base_mut().take_dirty();
        }
        dirty
    }

    /// Flag every element for repaint.
    pub fn mark_all_dirty(&mut self) {
        for node in self.nodes.values_mut() {
            node.element.base_mut().mark_dirty();
        }
    }

    // =========================================================================
    // Debugging
    // =========================================================================

    /// Indented dump of the attached tree in render order.
    pub fn format_tree(&self) -> String {
        self.format_tree_with(TreeFormatOptions::default())
    }

    pub fn format_tree_with(&self, options: TreeFormatOptions) -> String {
        let mut formatter = TreeFormatter::new(options);
        self.format_node(&mut formatter, self.root, 0, true);
        formatter.finish()
    }

    fn format_node(&self, formatter: &mut TreeFormatter, id: ElementId, depth: usize, is_last: bool) {
        if !formatter.within_depth(depth) {
            return;
        }
        let Some(element) = self.get(id) else {
            return;
        };
        let base = element.base();
        let mut label = format!("{} '{}'", element.type_name(), base.identifier());
        if formatter.options().show_ids {
            label.push_str(&format!(" {id:?}"));
        }
        if formatter.options().show_bounds {
            let b = base.bounds();
            label.push_str(&format!(" [{},{} {}x{}] z={}", b.x, b.y, b.width, b.height, base.z_index()));
        }
        if !base.is_visible() {
            label.push_str(" hidden");
        }
        if base.is_focused() {
            label.push_str(" focused");
        }
        formatter.push_node(depth, is_last, &label);

        let children = zorder::sorted_children(self, id);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.format_node(formatter, child, depth + 1, i + 1 == count);
        }
    }
}
