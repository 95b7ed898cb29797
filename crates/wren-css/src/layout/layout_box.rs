//! The geometry tree produced by layout.

use serde::Serialize;
use wren_dom::NodeId;

use super::box_model::{BoxDimensions, Rect};

/// What kind of box this is; drives both layout and painting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BoxType {
    /// Block-level container.
    Block,
    /// A line fragment of text. A single text node wrapped across lines
    /// produces one of these per line.
    Text {
        /// The fragment's characters.
        text: String,
    },
    /// Replaced content with an intrinsic size (an image).
    Replaced {
        /// The resource reference, if the element carried one.
        src: Option<String>,
    },
}

/// One box in the geometry tree.
///
/// The geometry tree is a filtered projection of the document: nodes
/// removed from rendering have no box, and a node may produce several
/// boxes (text fragments).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutBox {
    /// The originating document node.
    pub node: NodeId,
    /// Box category.
    pub box_type: BoxType,
    /// Resolved position and edge sizes.
    pub dimensions: BoxDimensions,
    /// Child boxes in document order.
    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    /// Shift this box and all its descendants by an offset.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.dimensions.content = self.dimensions.content.translated(dx, dy);
        for child in &mut self.children {
            child.translate(dx, dy);
        }
    }

    /// Union of this box's border box with all descendants'.
    #[must_use]
    pub fn subtree_bounds(&self) -> Rect {
        let mut bounds = self.dimensions.border_box();
        for child in &self.children {
            bounds = bounds.union(&child.subtree_bounds());
        }
        bounds
    }

    /// First box originating from `node`, in document order.
    #[must_use]
    pub fn find(&self, node: NodeId) -> Option<&Self> {
        if self.node == node {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(node))
    }

    /// Visit every box in document order.
    pub fn for_each<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        for child in &self.children {
            child.for_each(visit);
        }
    }
}
