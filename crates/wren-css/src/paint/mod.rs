//! Paint scheduling: display list construction and damage computation.

/// Frame diffing and damage regions.
pub mod diff;
/// Display items and list construction.
pub mod display_list;

pub use diff::{DamageRegion, diff};
pub use display_list::{DisplayItem, DisplayList, ItemKind, build_display_list};

use wren_dom::DomTree;

use crate::cascade::StyleMap;
use crate::layout::{LayoutBox, Viewport};

/// Produce the next frame's display list and the damage region relative
/// to the previous frame. Only the damage region needs re-rasterizing;
/// the rest of the previous frame's pixels are retained.
#[must_use]
pub fn paint(
    layout: &LayoutBox,
    tree: &DomTree,
    styles: &StyleMap,
    viewport: Viewport,
    scroll: (f32, f32),
    previous: &DisplayList,
) -> (DisplayList, DamageRegion) {
    let next = build_display_list(layout, tree, styles, viewport, scroll);
    let damage = diff(previous, &next);
    (next, damage)
}
