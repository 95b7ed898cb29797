//! Computed style representation and property value types.
//!
//! [CSS Cascading Level 4](https://www.w3.org/TR/css-cascade-4/)

use serde::Serialize;

/// Default font size when no rule sets one.
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// An sRGB color with alpha.
///
/// [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorValue {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl ColorValue {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// An opaque color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Whether the color contributes no pixels.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Parse a color value: `#rgb`, `#rrggbb`, or a named color.
    ///
    /// [§ 5 sRGB Colors](https://www.w3.org/TR/css-color-4/#numeric-srgb)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        Self::from_name(value)
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        match hex.len() {
            3 => {
                let mut channels = [0_u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let digit = u8::try_from(c.to_digit(16)?).ok()?;
                    channels[i] = digit * 16 + digit;
                }
                Some(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => {
                let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
                let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
                let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// [§ 6.1 Named Colors](https://www.w3.org/TR/css-color-4/#named-colors)
    fn from_name(name: &str) -> Option<Self> {
        let color = match name.to_ascii_lowercase().as_str() {
            "black" => Self::rgb(0, 0, 0),
            "white" => Self::rgb(255, 255, 255),
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 128, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "orange" => Self::rgb(255, 165, 0),
            "purple" => Self::rgb(128, 0, 128),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            "silver" => Self::rgb(192, 192, 192),
            "navy" => Self::rgb(0, 0, 128),
            "teal" => Self::rgb(0, 128, 128),
            "maroon" => Self::rgb(128, 0, 0),
            "olive" => Self::rgb(128, 128, 0),
            "lime" => Self::rgb(0, 255, 0),
            "aqua" | "cyan" => Self::rgb(0, 255, 255),
            "fuchsia" | "magenta" => Self::rgb(255, 0, 255),
            "transparent" => Self::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }
}

/// Parse a pixel length: `12px`, or a bare number treated as pixels.
#[must_use]
pub fn parse_length_px(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    let parsed: f32 = number.parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

/// The outer display category of a box.
///
/// [CSS Display Level 3 § 2](https://www.w3.org/TR/css-display-3/#the-display-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DisplayValue {
    /// Block-level box: fills its containing block's width.
    Block,
    /// Inline-level box: flows left-to-right, wrapping across lines.
    #[default]
    Inline,
    /// The element and its whole subtree are removed from rendering.
    None,
}

impl DisplayValue {
    /// Parse a display keyword.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "block" => Some(Self::Block),
            "inline" => Some(Self::Inline),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Per-side widths for margin, padding, or border.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeWidths {
    /// Top edge, px.
    pub top: f32,
    /// Right edge, px.
    pub right: f32,
    /// Bottom edge, px.
    pub bottom: f32,
    /// Left edge, px.
    pub left: f32,
}

impl EdgeWidths {
    /// The same width on every side.
    #[must_use]
    pub const fn uniform(width: f32) -> Self {
        Self {
            top: width,
            right: width,
            bottom: width,
            left: width,
        }
    }

    /// Combined left + right widths.
    #[must_use]
    pub fn horizontal(self) -> f32 {
        self.left + self.right
    }

    /// Combined top + bottom widths.
    #[must_use]
    pub fn vertical(self) -> f32 {
        self.top + self.bottom
    }
}

/// The resolved style of one element.
///
/// Inherited properties (`color`, `font-size`) default to the parent's
/// computed value; everything else defaults to its initial value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStyle {
    /// Outer display category.
    pub display: DisplayValue,
    /// Text color. Inherited.
    pub color: ColorValue,
    /// Font size in px. Inherited.
    pub font_size: f32,
    /// Background fill.
    pub background: ColorValue,
    /// Explicit content width, if set.
    pub width: Option<f32>,
    /// Explicit content height, if set.
    pub height: Option<f32>,
    /// Margin widths.
    pub margin: EdgeWidths,
    /// Padding widths.
    pub padding: EdgeWidths,
    /// Border widths.
    pub border: EdgeWidths,
    /// Stacking level. Unset is 0; ties break by document order.
    pub z_index: i32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: DisplayValue::Inline,
            color: ColorValue::BLACK,
            font_size: DEFAULT_FONT_SIZE_PX,
            background: ColorValue::TRANSPARENT,
            width: None,
            height: None,
            margin: EdgeWidths::default(),
            padding: EdgeWidths::default(),
            border: EdgeWidths::default(),
            z_index: 0,
        }
    }
}

impl ComputedStyle {
    /// The style a node starts from before any declarations apply:
    /// inherited properties copied from the parent, the rest initial.
    ///
    /// [§ 7.3 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
    #[must_use]
    pub fn inherited_from(parent: Option<&Self>) -> Self {
        let mut style = Self::default();
        if let Some(parent) = parent {
            style.color = parent.color;
            style.font_size = parent.font_size;
        }
        style
    }

    /// Apply one declaration. Returns false for an unrecognized property
    /// or unparsable value; the caller drops the declaration.
    pub fn apply_declaration(&mut self, name: &str, value: &str) -> bool {
        match name {
            "display" => {
                let Some(display) = DisplayValue::parse(value) else {
                    return false;
                };
                self.display = display;
            }
            "color" => {
                let Some(color) = ColorValue::parse(value) else {
                    return false;
                };
                self.color = color;
            }
            "background" | "background-color" => {
                let Some(color) = ColorValue::parse(value) else {
                    return false;
                };
                self.background = color;
            }
            "font-size" => {
                let Some(size) = parse_length_px(value) else {
                    return false;
                };
                self.font_size = size;
            }
            "width" => {
                let Some(width) = parse_length_px(value) else {
                    return false;
                };
                self.width = Some(width);
            }
            "height" => {
                let Some(height) = parse_length_px(value) else {
                    return false;
                };
                self.height = Some(height);
            }
            "margin" => {
                let Some(edges) = parse_edge_shorthand(value) else {
                    return false;
                };
                self.margin = edges;
            }
            "padding" => {
                let Some(edges) = parse_edge_shorthand(value) else {
                    return false;
                };
                self.padding = edges;
            }
            "border-width" => {
                let Some(edges) = parse_edge_shorthand(value) else {
                    return false;
                };
                self.border = edges;
            }
            "margin-top" | "margin-right" | "margin-bottom" | "margin-left" => {
                return apply_side(&mut self.margin, name, value);
            }
            "padding-top" | "padding-right" | "padding-bottom" | "padding-left" => {
                return apply_side(&mut self.padding, name, value);
            }
            "z-index" => {
                let Some(z) = value.trim().parse::<i32>().ok() else {
                    return false;
                };
                self.z_index = z;
            }
            _ => return false,
        }
        true
    }
}

fn apply_side(edges: &mut EdgeWidths, name: &str, value: &str) -> bool {
    let Some(length) = parse_length_px(value) else {
        return false;
    };
    match name.rsplit_once('-').map(|(_, side)| side) {
        Some("top") => edges.top = length,
        Some("right") => edges.right = length,
        Some("bottom") => edges.bottom = length,
        Some("left") => edges.left = length,
        _ => return false,
    }
    true
}

/// [CSS Box Model § shorthand](https://www.w3.org/TR/css-box-3/#margin-shorthand)
///
/// 1 value: all sides; 2: vertical horizontal; 3: top horizontal bottom;
/// 4: top right bottom left.
fn parse_edge_shorthand(value: &str) -> Option<EdgeWidths> {
    let parts: Vec<f32> = value
        .split_ascii_whitespace()
        .map(parse_length_px)
        .collect::<Option<Vec<f32>>>()?;
    let edges = match parts.as_slice() {
        [all] => EdgeWidths::uniform(*all),
        [vertical, horizontal] => EdgeWidths {
            top: *vertical,
            right: *horizontal,
            bottom: *vertical,
            left: *horizontal,
        },
        [top, horizontal, bottom] => EdgeWidths {
            top: *top,
            right: *horizontal,
            bottom: *bottom,
            left: *horizontal,
        },
        [top, right, bottom, left] => EdgeWidths {
            top: *top,
            right: *right,
            bottom: *bottom,
            left: *left,
        },
        _ => return None,
    };
    Some(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(ColorValue::parse("#ff0000"), Some(ColorValue::rgb(255, 0, 0)));
        assert_eq!(ColorValue::parse("#f00"), Some(ColorValue::rgb(255, 0, 0)));
        assert_eq!(ColorValue::parse("#12345"), None);
    }

    #[test]
    fn parses_named_colors() {
        assert_eq!(ColorValue::parse("Navy"), Some(ColorValue::rgb(0, 0, 128)));
        assert_eq!(ColorValue::parse("nope"), None);
    }

    #[test]
    fn inherits_color_and_font_size_only() {
        let parent = ComputedStyle {
            color: ColorValue::rgb(1, 2, 3),
            font_size: 20.0,
            background: ColorValue::WHITE,
            ..ComputedStyle::default()
        };
        let child = ComputedStyle::inherited_from(Some(&parent));
        assert_eq!(child.color, parent.color);
        assert!((child.font_size - 20.0).abs() < f32::EPSILON);
        assert_eq!(child.background, ColorValue::TRANSPARENT);
    }

    #[test]
    fn edge_shorthand_forms() {
        let mut style = ComputedStyle::default();
        assert!(style.apply_declaration("margin", "1px 2px 3px 4px"));
        assert!((style.margin.left - 4.0).abs() < f32::EPSILON);
        assert!(style.apply_declaration("padding", "5px"));
        assert!((style.padding.top - 5.0).abs() < f32::EPSILON);
        assert!((style.padding.bottom - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_declaration_is_rejected() {
        let mut style = ComputedStyle::default();
        assert!(!style.apply_declaration("color", "#notacolor"));
        assert!(!style.apply_declaration("width", "wide"));
        assert!(!style.apply_declaration("florb", "12px"));
        assert_eq!(style, ComputedStyle::default());
    }
}
