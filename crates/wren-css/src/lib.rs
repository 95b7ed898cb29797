//! Stylesheet parsing, cascade, layout, and paint scheduling for the Wren
//! rendering pipeline.
//!
//! # Scope
//!
//! - **Parser** - single-pass rule parsing with per-declaration error
//!   recovery
//! - **Selectors** - type/class/ID/universal compounds with descendant and
//!   child combinators, and specificity
//! - **Cascade** - dirty-aware style resolution ordered by (origin,
//!   specificity, source order), with inheritance and the user-agent sheet
//!   at lowest precedence
//! - **Layout** - block and inline flow with per-scope geometry caching
//! - **Paint** - stacking-ordered display lists, positional diffing, and
//!   damage regions

/// Style resolution and the cascade.
pub mod cascade;
/// Block/inline layout and the geometry tree.
pub mod layout;
/// Display lists, diffing, and damage.
pub mod paint;
/// Stylesheet text parsing.
pub mod parser;
/// Selector parsing and matching.
pub mod selector;
/// Computed styles and property values.
pub mod style;
/// Built-in default rules.
pub mod ua_stylesheet;

pub use cascade::{StyleMap, compute_styles, resolve_styles};
pub use layout::{
    ApproximateFontMetrics, BoxDimensions, BoxType, FontMetrics, LayoutBox, LayoutEngine, Rect,
    Viewport,
};
pub use paint::{DamageRegion, DisplayItem, DisplayList, ItemKind, build_display_list, paint};
pub use parser::{Declaration, Origin, StyleRule, Stylesheet, parse_stylesheet};
pub use selector::{ParsedSelector, Specificity, parse_selector};
pub use style::{ColorValue, ComputedStyle, DEFAULT_FONT_SIZE_PX, DisplayValue, EdgeWidths};
pub use ua_stylesheet::ua_stylesheet;

use wren_dom::{DomTree, NodeId};

/// Concatenated text of every `<style>` element, in document order, which
/// is the order their rules enter the cascade. External `<link>`
/// stylesheets are discovered by the parser's resource sink and appended
/// on arrival.
///
/// [CSS Cascading § 6.1](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
#[must_use]
pub fn extract_style_content(tree: &DomTree) -> String {
    let mut css = String::new();
    for id in tree.subtree(NodeId::ROOT) {
        if tree
            .as_element(id)
            .is_some_and(|data| data.tag_name.eq_ignore_ascii_case("style"))
        {
            css.push_str(&tree.text_content(id));
            css.push('\n');
        }
    }
    css
}
