//! Inline formatting: text measurement and line wrapping.
//!
//! [CSS 2.1 § 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)

use wren_dom::NodeId;

use super::box_model::{BoxDimensions, Rect};
use super::layout_box::{BoxType, LayoutBox};
use crate::style::ComputedStyle;

/// Measures text for line breaking. Layout is pluggable over this so the
/// engine can run with either real rasterizer metrics or an approximation.
pub trait FontMetrics {
    /// Horizontal advance of `text` at `font_size` pixels.
    fn advance(&self, text: &str, font_size: f32) -> f32;

    /// Vertical extent of one line at `font_size` pixels.
    fn line_height(&self, font_size: f32) -> f32 {
        font_size * 1.2
    }
}

/// Width-proportional metrics for use without a loaded font.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        // Average glyph advance for proportional latin text.
        let units = text.chars().count();
        let count = u32::try_from(units).unwrap_or(u32::MAX);
        let count_f = f64::from(count);
        let approx = count_f * f64::from(font_size) * 0.5;
        approx as f32
    }
}

/// An in-progress inline formatting context inside one block.
///
/// Items are placed left-to-right; when the remaining width is
/// insufficient the cursor wraps to a new line. Produces the finished
/// fragment boxes and the total height consumed.
pub struct LineLayout<'a> {
    metrics: &'a dyn FontMetrics,
    /// Left edge of the content area.
    origin_x: f32,
    /// Top of the first line.
    origin_y: f32,
    /// Available line width.
    width: f32,
    cursor_x: f32,
    cursor_y: f32,
    /// Tallest item on the current line.
    line_height: f32,
    boxes: Vec<LayoutBox>,
}

impl<'a> LineLayout<'a> {
    /// Start an inline context at the given content origin and width.
    pub fn new(metrics: &'a dyn FontMetrics, origin_x: f32, origin_y: f32, width: f32) -> Self {
        Self {
            metrics,
            origin_x,
            origin_y,
            width,
            cursor_x: 0.0,
            cursor_y: 0.0,
            line_height: 0.0,
            boxes: Vec::new(),
        }
    }

    /// Whether anything has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    fn wrap(&mut self) {
        self.cursor_y += self.line_height;
        self.cursor_x = 0.0;
        self.line_height = 0.0;
    }

    fn fits(&self, advance: f32) -> bool {
        self.cursor_x <= f32::EPSILON || self.cursor_x + advance <= self.width
    }

    /// Flow a text node into the line context, breaking at word
    /// boundaries. Each maximal run on one line becomes one fragment box.
    pub fn add_text(&mut self, node: NodeId, text: &str, style: &ComputedStyle) {
        let font_size = style.font_size;
        let line_height = self.metrics.line_height(font_size);
        let space = self.metrics.advance(" ", font_size);

        let mut run = String::new();
        let mut run_start_x = self.cursor_x;
        for word in text.split_whitespace() {
            let word_advance = self.metrics.advance(word, font_size);
            let lead = if run.is_empty() { 0.0 } else { space };
            if self.fits(lead + word_advance) {
                if !run.is_empty() {
                    self.cursor_x += space;
                    run.push(' ');
                }
            } else {
                self.flush_run(node, &mut run, run_start_x, font_size, line_height);
                self.wrap();
            }
            if run.is_empty() {
                run_start_x = self.cursor_x;
            }
            self.place_word(&mut run, word, word_advance, line_height);
        }
        self.flush_run(node, &mut run, run_start_x, font_size, line_height);
    }

    fn place_word(&mut self, run: &mut String, word: &str, advance: f32, line_height: f32) {
        run.push_str(word);
        self.cursor_x += advance;
        self.line_height = self.line_height.max(line_height);
    }

    fn flush_run(
        &mut self,
        node: NodeId,
        run: &mut String,
        start_x: f32,
        font_size: f32,
        line_height: f32,
    ) {
        if run.is_empty() {
            return;
        }
        let text = std::mem::take(run);
        let width = self.cursor_x - start_x;
        self.boxes.push(LayoutBox {
            node,
            box_type: BoxType::Text { text },
            dimensions: BoxDimensions {
                content: Rect::new(
                    self.origin_x + start_x,
                    self.origin_y + self.cursor_y,
                    width,
                    line_height.max(font_size),
                ),
                ..BoxDimensions::default()
            },
            children: Vec::new(),
        });
    }

    /// Place an atomic inline item (a replaced box) of the given size.
    pub fn add_replaced(&mut self, node: NodeId, src: Option<String>, width: f32, height: f32) {
        if !self.fits(width) {
            self.wrap();
        }
        self.boxes.push(LayoutBox {
            node,
            box_type: BoxType::Replaced { src },
            dimensions: BoxDimensions {
                content: Rect::new(
                    self.origin_x + self.cursor_x,
                    self.origin_y + self.cursor_y,
                    width,
                    height,
                ),
                ..BoxDimensions::default()
            },
            children: Vec::new(),
        });
        self.cursor_x += width;
        self.line_height = self.line_height.max(height);
    }

    /// Finish the context: returns the fragment boxes and total height.
    #[must_use]
    pub fn finish(mut self) -> (Vec<LayoutBox>, f32) {
        if self.line_height > 0.0 {
            self.wrap();
        }
        (self.boxes, self.cursor_y)
    }
}
