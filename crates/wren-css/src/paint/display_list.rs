//! Display list construction.
//!
//! [CSS 2.1 Appendix E Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)

use serde::Serialize;
use wren_dom::DomTree;

use crate::cascade::StyleMap;
use crate::layout::{BoxType, LayoutBox, Rect, Viewport};
use crate::style::{ColorValue, DEFAULT_FONT_SIZE_PX};

/// What one display item draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ItemKind {
    /// Solid fill (backgrounds).
    Rect {
        /// Fill color.
        color: ColorValue,
    },
    /// One line fragment of text.
    Text {
        /// The characters.
        text: String,
        /// Font size in px.
        font_size: f32,
        /// Text color.
        color: ColorValue,
    },
    /// Replaced content blit, keyed by its source reference.
    Image {
        /// Lookup key into the loaded-image store.
        src: String,
    },
}

/// One ordered paint operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayItem {
    /// The painted area, in document coordinates.
    pub bounds: Rect,
    /// Stacking level; higher paints later. Unset styles are 0 and ties
    /// keep document order.
    pub stacking: i32,
    /// The operation.
    pub kind: ItemKind,
}

/// A frame's paint operations in back-to-front order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayList {
    /// Items, back to front.
    pub items: Vec<DisplayItem>,
}

impl DisplayList {
    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Build the display list for a laid-out frame.
///
/// Walks the geometry tree in document order emitting backgrounds, text,
/// and images, then stable-sorts by stacking level so explicit levels
/// reorder while ties keep document order. Boxes wholly outside the
/// scrolled viewport are culled here and never enter the list.
#[must_use]
pub fn build_display_list(
    layout: &LayoutBox,
    tree: &DomTree,
    styles: &StyleMap,
    viewport: Viewport,
    scroll: (f32, f32),
) -> DisplayList {
    let visible = Rect::new(scroll.0, scroll.1, viewport.width, viewport.height);
    let mut items: Vec<DisplayItem> = Vec::new();

    layout.for_each(&mut |layout_box| {
        let item = match &layout_box.box_type {
            BoxType::Block => {
                let Some(style) = styles.get(&layout_box.node) else {
                    return;
                };
                if style.background.is_transparent() {
                    return;
                }
                DisplayItem {
                    bounds: layout_box.dimensions.border_box(),
                    stacking: style.z_index,
                    kind: ItemKind::Rect {
                        color: style.background,
                    },
                }
            }
            BoxType::Text { text } => {
                // A text fragment draws with its containing element's style.
                let parent_style = tree.parent(layout_box.node).and_then(|p| styles.get(&p));
                DisplayItem {
                    bounds: layout_box.dimensions.content,
                    stacking: parent_style.map_or(0, |s| s.z_index),
                    kind: ItemKind::Text {
                        text: text.clone(),
                        font_size: parent_style.map_or(DEFAULT_FONT_SIZE_PX, |s| s.font_size),
                        color: parent_style.map_or(ColorValue::BLACK, |s| s.color),
                    },
                }
            }
            BoxType::Replaced { src } => {
                let Some(src) = src else { return };
                DisplayItem {
                    bounds: layout_box.dimensions.content,
                    stacking: styles.get(&layout_box.node).map_or(0, |s| s.z_index),
                    kind: ItemKind::Image { src: src.clone() },
                }
            }
        };
        if item.bounds.intersects(&visible) {
            items.push(item);
        }
    });

    // Stable: equal stacking levels stay in document order.
    items.sort_by_key(|item| item.stacking);
    DisplayList { items }
}
