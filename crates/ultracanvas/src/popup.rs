//! Registry of active popups.
//!
//! Dropdown lists, menus and similar overlays register with their window
//! while open. Registered popups get pointer events before the element tree,
//! are told about presses outside all of them, receive keyboard input first
//! and render above everything else in registration order.
//!
//! Removal is deferred: [`PopupRegistry::remove`] only marks the popup, and
//! the window drops it at the start of the next dispatch cycle. The list is
//! never mutated while it is being iterated.

use ultracanvas_core::logging::targets;

use crate::id::ElementId;

#[derive(Debug, Default, Clone)]
pub struct PopupRegistry {
    active: Vec<ElementId>,
    pending_removal: Vec<ElementId>,
}

impl PopupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a popup. Re-adding an open popup cancels a pending removal
    /// and keeps its place in the order.
    pub fn add(&mut self, id: ElementId) {
        self.pending_removal.retain(|&p| p != id);
        if !self.active.contains(&id) {
            self.active.push(id);
            tracing::debug!(target: targets::POPUP, ?id, count = self.active.len(), "popup registered");
        }
    }

    /// Mark a popup for removal at the next dispatch cycle.
    pub fn remove(&mut self, id: ElementId) {
        if self.active.contains(&id) && !self.pending_removal.contains(&id) {
            self.pending_removal.push(id);
        }
    }

    /// Apply deferred removals. Returns the removed popups.
    pub fn process_pending(&mut self) -> Vec<ElementId> {
        if self.pending_removal.is_empty() {
            return Vec::new();
        }
        let removed = std::mem::take(&mut self.pending_removal);
        self.active.retain(|id| !removed.contains(id));
        tracing::debug!(target: targets::POPUP, ?removed, remaining = self.active.len(), "popups unregistered");
        removed
    }

    /// Drop a popup right away, e.g. when its element is destroyed.
    pub fn forget(&mut self, id: ElementId) {
        self.active.retain(|&p| p != id);
        self.pending_removal.retain(|&p| p != id);
    }

    /// Active popups in registration order, excluding pending removals.
    pub fn active(&self) -> Vec<ElementId> {
        self.active
            .iter()
            .copied()
            .filter(|id| !self.pending_removal.contains(id))
            .collect()
    }

    pub fn is_active(&self, id: ElementId) -> bool {
        self.active.contains(&id) && !self.pending_removal.contains(&id)
    }

    pub fn is_pending_removal(&self, id: ElementId) -> bool {
        self.pending_removal.contains(&id)
    }

    /// Whether any popup is registered and not pending removal.
    pub fn has_active(&self) -> bool {
        self.active.iter().any(|id| !self.pending_removal.contains(id))
    }

    /// The most recently registered active popup; it owns keyboard input.
    pub fn topmost(&self) -> Option<ElementId> {
        self.active.iter().rev().copied().find(|id| !self.pending_removal.contains(id))
    }

    /// The most recently registered active popup for which `contains` holds.
    pub fn topmost_where(&self, mut contains: impl FnMut(ElementId) -> bool) -> Option<ElementId> {
        self.active
            .iter()
            .rev()
            .copied()
            .filter(|id| !self.pending_removal.contains(id))
            .find(|&id| contains(id))
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.pending_removal.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ElementId> {
        let mut map: SlotMap<ElementId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_removal_is_deferred() {
        let ids = ids(2);
        let mut popups = PopupRegistry::new();
        popups.add(ids[0]);
        popups.add(ids[1]);
        popups.remove(ids[0]);

        assert!(!popups.is_active(ids[0]));
        assert!(popups.is_pending_removal(ids[0]));
        assert_eq!(popups.active(), vec![ids[1]]);

        assert_eq!(popups.process_pending(), vec![ids[0]]);
        assert!(!popups.is_pending_removal(ids[0]));
        assert!(popups.process_pending().is_empty());
    }

    #[test]
    fn test_readd_cancels_removal() {
        let ids = ids(1);
        let mut popups = PopupRegistry::new();
        popups.add(ids[0]);
        popups.add(ids[0]);
        popups.remove(ids[0]);
        popups.add(ids[0]);
        assert!(popups.process_pending().is_empty());
        assert_eq!(popups.active(), vec![ids[0]]);
    }

    #[test]
    fn test_topmost_is_last_registered() {
        let ids = ids(3);
        let mut popups = PopupRegistry::new();
        for &id in &ids {
            popups.add(id);
        }
        assert_eq!(popups.topmost(), Some(ids[2]));
        assert_eq!(popups.topmost_where(|id| id != ids[2]), Some(ids[1]));
        popups.remove(ids[2]);
        assert_eq!(popups.topmost(), Some(ids[1]));
        popups.forget(ids[1]);
        assert_eq!(popups.active(), vec![ids[0]]);
    }
}
