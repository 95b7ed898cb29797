//! Shared document handle: the mutation API handed to collaborators.
//!
//! The tree, its dirty tracker, and everything derived from them are owned by
//! a single logical pipeline thread. [`DocumentHandle`] is a cheaply-clonable
//! `Rc<RefCell<…>>` over that state, so the tree builder can keep building
//! while a suspended script call mutates the same document, with every
//! mutation routed through [`InvalidationTracker::mutate`]. Borrows are taken
//! per operation and never held across a collaborator call.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::{ChangeKind, DomTree, ElementData, InvalidationTracker, NodeId, NodeType};

/// The document tree together with its dirty tracker.
#[derive(Debug, Default)]
pub struct DocumentState {
    /// The document tree.
    pub tree: DomTree,
    /// Dirty tracking for the tree.
    pub tracker: InvalidationTracker,
}

impl DocumentState {
    /// Create a fresh document (root node only, nothing dirty).
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: DomTree::new(),
            tracker: InvalidationTracker::new(),
        }
    }
}

/// Cheaply-clonable handle to the single-threaded document state.
///
/// All reads and mutations from collaborators (script bindings, resource
/// arrival, the tree builder itself) go through this handle; mutating
/// methods route through the tracker so that derived state is invalidated
/// consistently no matter who performed the change.
#[derive(Debug, Clone, Default)]
pub struct DocumentHandle {
    inner: Rc<RefCell<DocumentState>>,
}

impl DocumentHandle {
    /// Create a handle over a fresh document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocumentState::new())),
        }
    }

    /// Whether two handles refer to the same document.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Borrow the document state immutably.
    ///
    /// # Panics
    /// Panics if the state is currently mutably borrowed.
    #[must_use]
    pub fn state(&self) -> Ref<'_, DocumentState> {
        self.inner.borrow()
    }

    /// Borrow the document state mutably.
    ///
    /// # Panics
    /// Panics if the state is currently borrowed.
    #[must_use]
    pub fn state_mut(&self) -> RefMut<'_, DocumentState> {
        self.inner.borrow_mut()
    }

    // --- queries -----------------------------------------------------------

    /// First element in tree order with the given id attribute.
    #[must_use]
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.state().tree.element_by_id(element_id)
    }

    /// All elements with the given tag name, in tree order.
    #[must_use]
    pub fn elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        self.state().tree.elements_by_tag_name(tag)
    }

    /// The node's tag name, if it is an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.state()
            .tree
            .as_element(id)
            .map(|data| data.tag_name.clone())
    }

    /// An attribute value, if the node is an element carrying it.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.state()
            .tree
            .as_element(id)
            .and_then(|data| data.attrs.get(name).map(ToString::to_string))
    }

    /// Concatenated descendant text of the node.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.state().tree.text_content(id)
    }

    // --- mutations (every one routes through the tracker) ------------------

    /// Report a change directly. Collaborators that know the precise change
    /// kind (e.g. a color-only restyle, a replaced box's intrinsic size
    /// arriving) use this entry point.
    pub fn mutate(&self, id: NodeId, change: ChangeKind) {
        let mut state = self.state_mut();
        let DocumentState { tree, tracker } = &mut *state;
        tracker.mutate(tree, id, change);
    }

    /// Set an attribute on an element, invalidating its style.
    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) {
        let mut state = self.state_mut();
        let DocumentState { tree, tracker } = &mut *state;
        if tree.set_attribute(id, name, value) {
            tracker.mutate(tree, id, ChangeKind::Attribute);
        }
    }

    /// Replace the node's content with a single text child.
    ///
    /// For a text node the character data is replaced in place; for an
    /// element the existing children are detached first.
    pub fn set_text_content(&self, id: NodeId, text: &str) {
        let mut state = self.state_mut();
        let DocumentState { tree, tracker } = &mut *state;
        if tree.set_text(id, text) {
            tracker.mutate(tree, id, ChangeKind::Text);
            return;
        }
        if tree.as_element(id).is_none() {
            return;
        }
        for child in tree.children(id).to_vec() {
            let _ = tree.remove_child(id, child);
        }
        let text_node = tree.alloc(NodeType::Text(text.to_string()));
        tree.append_child(id, text_node);
        tracker.mutate(tree, id, ChangeKind::Text);
    }

    /// Allocate a detached element node.
    #[must_use]
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.state_mut().tree.alloc(NodeType::Element(ElementData {
            tag_name: tag.to_ascii_lowercase(),
            attrs: crate::AttributesMap::new(),
        }))
    }

    /// Allocate a detached text node.
    #[must_use]
    pub fn create_text(&self, text: &str) -> NodeId {
        self.state_mut()
            .tree
            .alloc(NodeType::Text(text.to_string()))
    }

    /// Append a (detached) node as the last child of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut state = self.state_mut();
        let DocumentState { tree, tracker } = &mut *state;
        tree.append_child(parent, child);
        tracker.mutate(tree, parent, ChangeKind::ChildList);
    }

    /// Detach `child` from `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) {
        let mut state = self.state_mut();
        let DocumentState { tree, tracker } = &mut *state;
        if tree.remove_child(parent, child) {
            tracker.mutate(tree, parent, ChangeKind::ChildList);
        }
    }
}
