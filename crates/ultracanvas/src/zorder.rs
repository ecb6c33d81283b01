//! Z-order: layers, stable sorting, flattening and hit-testing.
//!
//! Z-indices are signed; larger values draw on top. Siblings with equal
//! z-index keep their insertion order, so later children draw over earlier
//! ones. The [`Layer`] constants reserve bands for the usual overlay kinds.

use std::collections::HashSet;

use ultracanvas_render::IntPoint;

use crate::id::ElementId;
use crate::tree::ElementTree;

/// Reserved z-index bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Background,
    Content,
    Controls,
    Overlays,
    Menus,
    Dropdowns,
    Modals,
    Popups,
    Tooltips,
    Debug,
}

impl Layer {
    pub const fn z(self) -> i32 {
        match self {
            Self::Background => -1000,
            Self::Content => 0,
            Self::Controls => 100,
            Self::Overlays => 500,
            Self::Menus => 1000,
            Self::Dropdowns => 1500,
            Self::Modals => 2000,
            Self::Popups => 2500,
            Self::Tooltips => 3000,
            Self::Debug => 9999,
        }
    }
}

impl From<Layer> for i32 {
    fn from(layer: Layer) -> Self {
        layer.z()
    }
}

fn z_of(tree: &ElementTree, id: ElementId) -> i32 {
    tree.get(id).map(|e| e.base().z_index()).unwrap_or(0)
}

/// Children of `id` in render order: ascending z, insertion order on ties.
pub fn sorted_children(tree: &ElementTree, id: ElementId) -> Vec<ElementId> {
    let mut children = tree.children(id).to_vec();
    // `sort_by_key` is stable.
    children.sort_by_key(|&c| z_of(tree, c));
    children
}

/// Sort an arbitrary set of elements into render order.
pub fn sort_by_z(tree: &ElementTree, ids: &mut [ElementId]) {
    ids.sort_by_key(|&c| z_of(tree, c));
}

/// Every element below `start` (inclusive) in render order.
///
/// Depth-first with a visited set, so a corrupted graph cannot loop.
pub fn flatten(tree: &ElementTree, start: ElementId) -> Vec<ElementId> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    flatten_into(tree, start, &mut visited, &mut out);
    out
}

fn flatten_into(tree: &ElementTree, id: ElementId, visited: &mut HashSet<ElementId>, out: &mut Vec<ElementId>) {
    if !tree.contains(id) || !visited.insert(id) {
        return;
    }
    out.push(id);
    for child in sorted_children(tree, id) {
        flatten_into(tree, child, visited, out);
    }
}

/// Every attached element whose visible area contains `point`, topmost
/// first. The root is not included.
pub fn elements_at_point(tree: &ElementTree, point: IntPoint) -> Vec<ElementId> {
    let root = tree.root();
    flatten(tree, root)
        .into_iter()
        .rev()
        .filter(|&id| id != root && tree.contains_point(id, point))
        .collect()
}

/// The deepest, topmost element under `point`, or `None` when only the
/// window itself is there.
///
/// Descends from the root, at each level picking the topmost child that
/// contains the point.
pub fn hit_test(tree: &ElementTree, point: IntPoint) -> Option<ElementId> {
    let mut current = tree.root();
    let mut hit = None;
    loop {
        let next = sorted_children(tree, current)
            .into_iter()
            .rev()
            .find(|&c| tree.contains_point(c, point));
        match next {
            Some(child) => {
                hit = Some(child);
                current = child;
            }
            None => return hit,
        }
    }
}

// =============================================================================
// Restacking
// =============================================================================

fn others(set: &[ElementId], id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
    set.iter().copied().filter(move |&o| o != id)
}

/// Raise `id` above every other member of `set`.
///
/// Does nothing when it is already strictly on top, so repeated calls
/// leave the ordering unchanged. Returns whether the z-index changed.
pub fn bring_to_front(tree: &mut ElementTree, id: ElementId, set: &[ElementId]) -> bool {
    let Some(max) = others(set, id).map(|o| z_of(tree, o)).max() else {
        return false;
    };
    if z_of(tree, id) > max {
        return false;
    }
    tree.set_z_index(id, max.saturating_add(1))
}

/// Lower `id` below every other member of `set`.
pub fn send_to_back(tree: &mut ElementTree, id: ElementId, set: &[ElementId]) -> bool {
    let Some(min) = others(set, id).map(|o| z_of(tree, o)).min() else {
        return false;
    };
    if z_of(tree, id) < min {
        return false;
    }
    tree.set_z_index(id, min.saturating_sub(1))
}

/// Swap `id` with the nearest member of `set` above it.
///
/// When nothing is above but other members share its z-index, steps one
/// above them instead.
pub fn move_up(tree: &mut ElementTree, id: ElementId, set: &[ElementId]) -> bool {
    let z = z_of(tree, id);
    let neighbor = others(set, id)
        .map(|o| (z_of(tree, o), o))
        .filter(|&(oz, _)| oz > z)
        .min_by_key(|&(oz, _)| oz);
    match neighbor {
        Some((nz, other)) => {
            tree.set_z_index(other, z);
            tree.set_z_index(id, nz)
        }
        None if others(set, id).any(|o| z_of(tree, o) == z) => tree.set_z_index(id, z.saturating_add(1)),
        None => false,
    }
}

/// Swap `id` with the nearest member of `set` below it.
pub fn move_down(tree: &mut ElementTree, id: ElementId, set: &[ElementId]) -> bool {
    let z = z_of(tree, id);
    let neighbor = others(set, id)
        .map(|o| (z_of(tree, o), o))
        .filter(|&(oz, _)| oz < z)
        .max_by_key(|&(oz, _)| oz);
    match neighbor {
        Some((nz, other)) => {
            tree.set_z_index(other, z);
            tree.set_z_index(id, nz)
        }
        None if others(set, id).any(|o| z_of(tree, o) == z) => tree.set_z_index(id, z.saturating_sub(1)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Container;
    use ultracanvas_render::IntRect;

    fn tree_with(zs: &[i32]) -> (ElementTree, Vec<ElementId>) {
        let mut tree = ElementTree::new(200, 200);
        let root = tree.root();
        let ids = zs
            .iter()
            .enumerate()
            .map(|(i, &z)| {
                let mut c = Container::new(format!("c{i}"), IntRect::new(0, 0, 100, 100));
                crate::Element::base_mut(&mut c).set_z_index(z);
                tree.add(root, c).unwrap()
            })
            .collect();
        (tree, ids)
    }

    #[test]
    fn test_sort_is_stable() {
        let (tree, ids) = tree_with(&[5, 0, 5, 0]);
        let order = sorted_children(&tree, tree.root());
        assert_eq!(order, vec![ids[1], ids[3], ids[0], ids[2]]);
    }

    #[test]
    fn test_layer_values() {
        assert_eq!(Layer::Background.z(), -1000);
        assert_eq!(Layer::Dropdowns.z(), 1500);
        assert_eq!(i32::from(Layer::Tooltips), 3000);
        assert_eq!(Layer::Debug.z(), 9999);
    }

    #[test]
    fn test_flatten_depth_first() {
        let mut tree = ElementTree::new(100, 100);
        let root = tree.root();
        let a = tree.add(root, Container::new("a", IntRect::ZERO)).unwrap();
        let a1 = tree.add(a, Container::new("a1", IntRect::ZERO)).unwrap();
        let b = tree.add(root, Container::new("b", IntRect::ZERO)).unwrap();
        assert_eq!(flatten(&tree, root), vec![root, a, a1, b]);
    }

    #[test]
    fn test_elements_at_point_topmost_first() {
        let (tree, ids) = tree_with(&[0, 10, 0]);
        let hits = elements_at_point(&tree, IntPoint::new(5, 5));
        assert_eq!(hits, vec![ids[1], ids[2], ids[0]]);
        assert_eq!(hit_test(&tree, IntPoint::new(5, 5)), Some(ids[1]));
        assert!(elements_at_point(&tree, IntPoint::new(150, 150)).is_empty());
        assert_eq!(hit_test(&tree, IntPoint::new(150, 150)), None);
    }

    #[test]
    fn test_empty_window_has_no_hits() {
        let tree = ElementTree::new(100, 100);
        assert!(elements_at_point(&tree, IntPoint::new(1, 1)).is_empty());
        assert_eq!(hit_test(&tree, IntPoint::new(1, 1)), None);
    }

    #[test]
    fn test_bring_to_front_idempotent() {
        let (mut tree, ids) = tree_with(&[1, 4, 2]);
        assert!(bring_to_front(&mut tree, ids[0], &ids));
        assert_eq!(z_of(&tree, ids[0]), 5);
        let order = sorted_children(&tree, tree.root());

        assert!(!bring_to_front(&mut tree, ids[0], &ids));
        assert_eq!(z_of(&tree, ids[0]), 5);
        assert_eq!(sorted_children(&tree, tree.root()), order);
    }

    #[test]
    fn test_send_to_back() {
        let (mut tree, ids) = tree_with(&[1, 4, 2]);
        assert!(send_to_back(&mut tree, ids[1], &ids));
        assert_eq!(z_of(&tree, ids[1]), 0);
        assert!(!send_to_back(&mut tree, ids[1], &ids));
    }

    #[test]
    fn test_move_up_and_down_swap_neighbors() {
        let (mut tree, ids) = tree_with(&[1, 4, 2]);
        assert!(move_up(&mut tree, ids[0], &ids));
        assert_eq!((z_of(&tree, ids[0]), z_of(&tree, ids[2])), (2, 1));

        assert!(move_down(&mut tree, ids[1], &ids));
        assert_eq!((z_of(&tree, ids[1]), z_of(&tree, ids[0])), (2, 4));

        // Topmost with no tie cannot move further up.
        assert!(!move_up(&mut tree, ids[0], &ids));
    }

    #[test]
    fn test_move_up_breaks_tie() {
        let (mut tree, ids) = tree_with(&[3, 3]);
        assert!(move_up(&mut tree, ids[0], &ids));
        assert_eq!(z_of(&tree, ids[0]), 4);
    }
}
