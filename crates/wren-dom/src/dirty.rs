//! Dirty tracking and the single mutation entry point.
//!
//! Every runtime change to the document tree — whether it comes from script
//! or from a resource arriving off-thread — is reported through
//! [`InvalidationTracker::mutate`]. The tracker accumulates per-node dirty
//! flags and coalesces any number of mutations into one dirty set, which the
//! engine consumes with exactly one restyle→relayout→repaint pass.

use std::collections::HashMap;

use crate::{DomTree, NodeId};

/// Per-node staleness flags for the three derived stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    /// Computed style must be recomputed for this node.
    pub style: bool,
    /// Geometry must be recomputed for this node.
    pub layout: bool,
    /// Display items for this node must be re-emitted.
    pub paint: bool,
}

impl DirtyFlags {
    /// Whether any flag is set.
    #[must_use]
    pub const fn any(self) -> bool {
        self.style || self.layout || self.paint
    }
}

/// The kind of change being reported through [`InvalidationTracker::mutate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// An attribute changed; selector matches and computed style may differ.
    Attribute,
    /// Character data changed; line breaking and box extents may differ.
    Text,
    /// A child was added or removed.
    ChildList,
    /// A replaced box learned its intrinsic size (resource arrival) or was
    /// explicitly resized.
    ReplacedSize,
    /// A visibility-only change (e.g. color) that cannot affect geometry.
    PaintOnly,
}

/// Accumulated dirty flags for a set of nodes.
///
/// Produced by [`InvalidationTracker::take`]; consumed by the style, layout
/// and paint stages to bound their recomputation scope.
#[derive(Debug, Clone, Default)]
pub struct DirtySet {
    flags: HashMap<NodeId, DirtyFlags>,
}

impl DirtySet {
    /// Whether no node carries any dirty flag.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flags for a node (all-clean if never marked).
    #[must_use]
    pub fn flags(&self, id: NodeId) -> DirtyFlags {
        self.flags.get(&id).copied().unwrap_or_default()
    }

    /// Whether the node's computed style is stale.
    #[must_use]
    pub fn style_dirty(&self, id: NodeId) -> bool {
        self.flags(id).style
    }

    /// Whether the node's geometry is stale.
    #[must_use]
    pub fn layout_dirty(&self, id: NodeId) -> bool {
        self.flags(id).layout
    }

    /// Whether the node's display items are stale.
    #[must_use]
    pub fn paint_dirty(&self, id: NodeId) -> bool {
        self.flags(id).paint
    }

    /// Whether any node in `root`'s subtree is layout-dirty.
    #[must_use]
    pub fn subtree_layout_dirty(&self, tree: &DomTree, root: NodeId) -> bool {
        tree.subtree(root).iter().any(|&id| self.layout_dirty(id))
    }

    /// All dirty nodes with their flags, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, DirtyFlags)> + '_ {
        self.flags.iter().map(|(&id, &flags)| (id, flags))
    }

    fn entry(&mut self, id: NodeId) -> &mut DirtyFlags {
        self.flags.entry(id).or_default()
    }
}

/// Records which nodes are stale after mutations and determines the minimal
/// recomputation scope.
///
/// Dirty-mark propagation invariants:
/// - layout-dirty marks all ancestors layout-dirty (a child's size change can
///   alter an ancestor's size) and the node's subtree paint-dirty (position
///   and size feed into paint);
/// - style-dirty marks the whole subtree style-dirty (inheritance) and
///   layout-dirty (inherited values feed geometry).
///
/// Mutations are coalesced: however many `mutate` calls arrive before the
/// next [`take`](Self::take), the engine runs exactly one pass over the
/// accumulated union.
#[derive(Debug, Default)]
pub struct InvalidationTracker {
    dirty: DirtySet,
    mutations: u64,
}

impl InvalidationTracker {
    /// Create a tracker with nothing dirty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The single entry point through which script and resource-arrival
    /// events report a tree change.
    pub fn mutate(&mut self, tree: &DomTree, id: NodeId, change: ChangeKind) {
        self.mutations += 1;
        match change {
            ChangeKind::Attribute => self.mark_style_dirty(tree, id),
            ChangeKind::Text | ChangeKind::ChildList | ChangeKind::ReplacedSize => {
                self.mark_layout_dirty(tree, id);
            }
            ChangeKind::PaintOnly => {
                self.dirty.entry(id).paint = true;
            }
        }
    }

    /// Mark the whole tree style-dirty (first run, stylesheet arrival).
    pub fn invalidate_all_styles(&mut self, tree: &DomTree) {
        self.mark_style_dirty(tree, tree.root());
    }

    /// Whether any mutation is pending a pass.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Total `mutate` calls observed (used to assert coalescing in tests).
    #[must_use]
    pub const fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// Take the accumulated dirty set, leaving the tracker clean.
    ///
    /// The engine calls this exactly once per scheduled pass, so N mutations
    /// between passes collapse into one recomputation over the union.
    pub fn take(&mut self) -> DirtySet {
        std::mem::take(&mut self.dirty)
    }

    /// Peek at the pending dirty set without consuming it.
    #[must_use]
    pub const fn pending(&self) -> &DirtySet {
        &self.dirty
    }

    fn mark_style_dirty(&mut self, tree: &DomTree, id: NodeId) {
        // Inheritance reaches every descendant, and inherited values feed
        // geometry (fonts drive line breaking and extents), so the whole
        // subtree goes style- and layout-dirty, not just the mutated node.
        for node in tree.subtree(id) {
            let flags = self.dirty.entry(node);
            flags.style = true;
            flags.layout = true;
            flags.paint = true;
        }
        for ancestor in tree.ancestors(id) {
            self.dirty.entry(ancestor).layout = true;
        }
    }

    fn mark_layout_dirty(&mut self, tree: &DomTree, id: NodeId) {
        self.dirty.entry(id).layout = true;
        for ancestor in tree.ancestors(id) {
            self.dirty.entry(ancestor).layout = true;
        }
        for node in tree.subtree(id) {
            self.dirty.entry(node).paint = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementData, NodeType};

    fn element(tag: &str) -> NodeType {
        NodeType::Element(ElementData {
            tag_name: tag.to_string(),
            attrs: crate::AttributesMap::new(),
        })
    }

    #[test]
    fn layout_dirty_propagates_to_ancestors_and_paints_subtree() {
        let mut tree = DomTree::new();
        let body = tree.alloc(element("body"));
        let p = tree.alloc(element("p"));
        let text = tree.alloc(NodeType::Text("hi".to_string()));
        tree.append_child(NodeId::ROOT, body);
        tree.append_child(body, p);
        tree.append_child(p, text);

        let mut tracker = InvalidationTracker::new();
        tracker.mutate(&tree, text, ChangeKind::Text);

        let dirty = tracker.take();
        assert!(dirty.layout_dirty(text));
        assert!(dirty.layout_dirty(p));
        assert!(dirty.layout_dirty(body));
        assert!(dirty.layout_dirty(NodeId::ROOT));
        assert!(dirty.paint_dirty(text));
        assert!(!dirty.style_dirty(text));
    }

    #[test]
    fn style_dirty_propagates_to_subtree() {
        let mut tree = DomTree::new();
        let body = tree.alloc(element("body"));
        let p = tree.alloc(element("p"));
        let span = tree.alloc(element("span"));
        tree.append_child(NodeId::ROOT, body);
        tree.append_child(body, p);
        tree.append_child(p, span);

        let mut tracker = InvalidationTracker::new();
        tracker.mutate(&tree, p, ChangeKind::Attribute);

        let dirty = tracker.take();
        assert!(dirty.style_dirty(p));
        assert!(dirty.style_dirty(span));
        assert!(!dirty.style_dirty(body));
        // Style implies layout throughout the subtree: inherited values
        // like font-size change descendant geometry.
        assert!(dirty.layout_dirty(p));
        assert!(dirty.layout_dirty(span));
        // Ancestors only re-measure; their styles are untouched.
        assert!(dirty.layout_dirty(body));
    }

    #[test]
    fn paint_only_marks_just_the_node() {
        let mut tree = DomTree::new();
        let body = tree.alloc(element("body"));
        let p = tree.alloc(element("p"));
        tree.append_child(NodeId::ROOT, body);
        tree.append_child(body, p);

        let mut tracker = InvalidationTracker::new();
        tracker.mutate(&tree, p, ChangeKind::PaintOnly);

        let dirty = tracker.take();
        assert!(dirty.paint_dirty(p));
        assert!(!dirty.layout_dirty(p));
        assert!(!dirty.layout_dirty(body));
        assert!(!dirty.style_dirty(p));
    }

    #[test]
    fn take_leaves_tracker_clean() {
        let mut tree = DomTree::new();
        let body = tree.alloc(element("body"));
        tree.append_child(NodeId::ROOT, body);

        let mut tracker = InvalidationTracker::new();
        tracker.mutate(&tree, body, ChangeKind::ChildList);
        assert!(tracker.has_pending());
        let _ = tracker.take();
        assert!(!tracker.has_pending());
        assert!(tracker.take().is_empty());
    }
}
