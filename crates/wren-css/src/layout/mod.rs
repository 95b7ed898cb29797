//! The layout engine: style-annotated tree in, geometry tree out.
//!
//! Block layout is top-down: a block box fills its containing block's
//! available width (minus horizontal margins) unless explicitly sized, and
//! its height is the sum of its children's extents plus padding and border.
//! Inline content flows through [`inline::LineLayout`]. Replaced boxes use
//! attribute-derived sizes, falling back to the intrinsic size reported
//! when their resource arrives, or zero until then.
//!
//! Each block element is an independent containing-block scope whose
//! resolved geometry is cached. Invalidation removes exactly the scopes on
//! the layout-dirty path; a clean scope re-encountered with the same
//! available width is reused by translation, never re-laid out.

/// Box model rectangles and edge arithmetic.
pub mod box_model;
/// Inline formatting and font measurement.
pub mod inline;
/// The geometry tree node.
pub mod layout_box;

pub use box_model::{BoxDimensions, Rect};
pub use inline::{ApproximateFontMetrics, FontMetrics, LineLayout};
pub use layout_box::{BoxType, LayoutBox};

use std::collections::HashMap;

use wren_dom::{DirtySet, DomTree, NodeId};

use crate::cascade::StyleMap;
use crate::style::{ComputedStyle, DisplayValue, parse_length_px};

/// The visible area the document is laid out against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in px.
    pub width: f32,
    /// Height in px.
    pub height: f32,
}

impl Viewport {
    /// A viewport of the given size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

struct CachedScope {
    available_width: f32,
    /// Geometry relative to the scope's margin-box origin.
    layout: LayoutBox,
}

/// Incremental block/inline layout with per-scope caching.
pub struct LayoutEngine {
    cache: HashMap<NodeId, CachedScope>,
    intrinsic_sizes: HashMap<NodeId, (f32, f32)>,
    scopes_computed: u64,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    /// An engine with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            intrinsic_sizes: HashMap::new(),
            scopes_computed: 0,
        }
    }

    /// Record a replaced element's intrinsic size (its resource arrived).
    /// The caller is responsible for layout-dirtying the node.
    pub fn set_intrinsic_size(&mut self, node: NodeId, width: f32, height: f32) {
        let _ = self.intrinsic_sizes.insert(node, (width, height));
    }

    /// How many containing-block scopes have been computed (not reused)
    /// since construction.
    #[must_use]
    pub const fn scopes_computed(&self) -> u64 {
        self.scopes_computed
    }

    /// Drop cached geometry for every layout-dirty node in the set.
    pub fn invalidate(&mut self, dirty: &DirtySet) {
        for (id, flags) in dirty.iter() {
            if flags.layout {
                let _ = self.cache.remove(&id);
            }
        }
    }

    /// Forget everything (navigation to a new document).
    pub fn clear(&mut self) {
        self.cache.clear();
        self.intrinsic_sizes.clear();
    }

    /// Lay out the document into a geometry tree rooted at a synthetic
    /// viewport-wide block.
    pub fn layout(
        &mut self,
        tree: &DomTree,
        styles: &StyleMap,
        viewport: Viewport,
        metrics: &dyn FontMetrics,
    ) -> LayoutBox {
        let root_style = ComputedStyle {
            display: DisplayValue::Block,
            ..ComputedStyle::default()
        };
        self.layout_block(
            tree,
            styles,
            metrics,
            NodeId::ROOT,
            &root_style,
            (0.0, 0.0),
            viewport.width,
        )
    }

    /// Lay out one block scope with its margin-box origin at `origin`.
    #[allow(clippy::too_many_arguments, reason = "recursion carries the pass context")]
    fn layout_block(
        &mut self,
        tree: &DomTree,
        styles: &StyleMap,
        metrics: &dyn FontMetrics,
        node: NodeId,
        style: &ComputedStyle,
        origin: (f32, f32),
        available_width: f32,
    ) -> LayoutBox {
        if let Some(cached) = self.cache.get(&node)
            && (cached.available_width - available_width).abs() < f32::EPSILON
        {
            let mut reused = cached.layout.clone();
            reused.translate(origin.0, origin.1);
            return reused;
        }

        self.scopes_computed += 1;

        let content_width = style.width.unwrap_or_else(|| {
            let filled = available_width
                - style.margin.horizontal()
                - style.border.horizontal()
                - style.padding.horizontal();
            if filled > 0.0 {
                filled
            } else {
                // Unresolvable constraint: shrink to fit the content.
                self.intrinsic_width(tree, styles, metrics, node)
            }
        });
        let content_x = origin.0 + style.margin.left + style.border.left + style.padding.left;
        let content_y = origin.1 + style.margin.top + style.border.top + style.padding.top;

        let mut children: Vec<LayoutBox> = Vec::new();
        let mut cursor_y = content_y;
        let mut line: Option<LineLayout<'_>> = None;

        for &child in tree.children(node) {
            if let Some(text) = tree.as_text(child) {
                let line_ctx = line.get_or_insert_with(|| {
                    LineLayout::new(metrics, content_x, cursor_y, content_width)
                });
                line_ctx.add_text(child, text, style);
                continue;
            }
            let Some(child_style) = styles.get(&child) else {
                continue;
            };
            match child_style.display {
                DisplayValue::None => {}
                DisplayValue::Inline => {
                    let line_ctx = line.get_or_insert_with(|| {
                        LineLayout::new(metrics, content_x, cursor_y, content_width)
                    });
                    self.flow_inline(tree, styles, child, child_style, line_ctx);
                }
                DisplayValue::Block => {
                    if let Some(open) = line.take() {
                        let (boxes, height) = open.finish();
                        children.extend(boxes);
                        cursor_y += height;
                    }
                    let child_box = self.layout_block(
                        tree,
                        styles,
                        metrics,
                        child,
                        child_style,
                        (content_x, cursor_y),
                        content_width,
                    );
                    cursor_y += child_box.dimensions.margin_box().height;
                    children.push(child_box);
                }
            }
        }
        if let Some(open) = line.take() {
            let (boxes, height) = open.finish();
            children.extend(boxes);
            cursor_y += height;
        }

        let content_height = style.height.unwrap_or(cursor_y - content_y);
        let layout = LayoutBox {
            node,
            box_type: BoxType::Block,
            dimensions: BoxDimensions {
                content: Rect::new(content_x, content_y, content_width, content_height),
                padding: style.padding,
                border: style.border,
                margin: style.margin,
            },
            children,
        };

        let mut relative = layout.clone();
        relative.translate(-origin.0, -origin.1);
        let _ = self.cache.insert(
            node,
            CachedScope {
                available_width,
                layout: relative,
            },
        );
        layout
    }

    /// Flow an inline element's content into the open line context. Inline
    /// elements produce no box of their own; their text flows with their
    /// own computed style and replaced children place atomically.
    fn flow_inline(
        &self,
        tree: &DomTree,
        styles: &StyleMap,
        node: NodeId,
        style: &ComputedStyle,
        line: &mut LineLayout<'_>,
    ) {
        if self.is_replaced(tree, node) {
            let (width, height) = self.replaced_size(tree, node, style);
            let src = tree
                .as_element(node)
                .and_then(|data| data.attrs.get("src").map(ToString::to_string));
            line.add_replaced(node, src, width, height);
            return;
        }
        for &child in tree.children(node) {
            if let Some(text) = tree.as_text(child) {
                line.add_text(child, text, style);
                continue;
            }
            let Some(child_style) = styles.get(&child) else {
                continue;
            };
            if child_style.display == DisplayValue::None {
                continue;
            }
            // Block boxes inside inline content are flattened into the
            // inline flow rather than breaking it.
            self.flow_inline(tree, styles, child, child_style, line);
        }
    }

    fn is_replaced(&self, tree: &DomTree, node: NodeId) -> bool {
        tree.as_element(node)
            .is_some_and(|data| data.tag_name.eq_ignore_ascii_case("img"))
    }

    /// Resolve a replaced box's size: explicit style, then size attributes,
    /// then the intrinsic size of the loaded resource, scaling to preserve
    /// the aspect ratio when only one dimension is fixed. Zero until any of
    /// those is known.
    fn replaced_size(&self, tree: &DomTree, node: NodeId, style: &ComputedStyle) -> (f32, f32) {
        let attr = |name: &str| {
            tree.as_element(node)
                .and_then(|data| data.attrs.get(name))
                .and_then(|value| parse_length_px(value))
        };
        let width = style.width.or_else(|| attr("width"));
        let height = style.height.or_else(|| attr("height"));
        let intrinsic = self.intrinsic_sizes.get(&node).copied();

        match (width, height, intrinsic) {
            (Some(w), Some(h), _) => (w, h),
            (Some(w), None, Some((iw, ih))) if iw > 0.0 => (w, w * ih / iw),
            (None, Some(h), Some((iw, ih))) if ih > 0.0 => (h * iw / ih, h),
            (Some(w), None, _) => (w, 0.0),
            (None, Some(h), _) => (0.0, h),
            (None, None, Some((iw, ih))) => (iw, ih),
            (None, None, None) => (0.0, 0.0),
        }
    }

    /// Widest single inline item under `node`; the shrink-to-fit fallback
    /// width for a block with no resolvable constraint.
    fn intrinsic_width(
        &self,
        tree: &DomTree,
        styles: &StyleMap,
        metrics: &dyn FontMetrics,
        node: NodeId,
    ) -> f32 {
        let mut widest: f32 = 0.0;
        for &child in tree.children(node) {
            if let Some(text) = tree.as_text(child) {
                let font_size = styles
                    .get(&node)
                    .map_or(crate::style::DEFAULT_FONT_SIZE_PX, |s| s.font_size);
                widest = widest.max(metrics.advance(text.trim(), font_size));
                continue;
            }
            let Some(child_style) = styles.get(&child) else {
                continue;
            };
            if child_style.display == DisplayValue::None {
                continue;
            }
            let child_width = if self.is_replaced(tree, child) {
                self.replaced_size(tree, child, child_style).0
            } else {
                self.intrinsic_width(tree, styles, metrics, child)
            };
            widest = widest.max(child_width);
        }
        widest
    }
}
