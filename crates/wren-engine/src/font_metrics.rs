//! Font metrics backed by fontdue for accurate text measurement during
//! layout.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)

use fontdue::{Font, FontSettings};
use wren_css::FontMetrics;

/// Common system font paths to search for a default font.
const FONT_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFNS.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// Try to load a usable system font.
///
/// Returns `None` when no candidate path yields a parseable font; callers
/// fall back to [`wren_css::ApproximateFontMetrics`] for layout and skip
/// text rasterization.
#[must_use]
pub fn load_system_font() -> Option<Font> {
    for path in FONT_SEARCH_PATHS {
        if let Ok(data) = std::fs::read(path)
            && let Ok(font) = Font::from_bytes(data, FontSettings::default())
        {
            return Some(font);
        }
    }
    None
}

/// Font measurement via fontdue's per-glyph metrics.
///
/// Uses `Font::metrics()` rather than `Font::rasterize()` so measurement
/// never pays for bitmap generation. The advance here matches the cursor
/// advancement the paint surface uses when drawing, so measured line
/// breaks line up with drawn glyphs.
pub struct FontdueMetrics<'a> {
    font: &'a Font,
}

impl<'a> FontdueMetrics<'a> {
    /// Metrics over a loaded font.
    #[must_use]
    pub const fn new(font: &'a Font) -> Self {
        Self { font }
    }
}

impl FontMetrics for FontdueMetrics<'_> {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .filter(|ch| !ch.is_control())
            .map(|ch| self.font.metrics(ch, font_size).advance_width)
            .sum()
    }
}
