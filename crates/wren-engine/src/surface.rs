//! Software paint surface for headless rendering.
//!
//! Executes a [`DisplayList`] into an RGBA pixel buffer, rasterizing text
//! with fontdue and blitting decoded images. The surface knows nothing
//! about CSS or the document tree: it takes drawing commands in
//! back-to-front order and pixels come out.
//!
//! Presentation is damage-scoped: given the [`DamageRegion`] from the
//! paint stage, only pixels inside the damaged rectangles are cleared and
//! redrawn; the rest of the previous frame is retained.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use fontdue::Font;
use image::{ImageBuffer, Rgba, RgbaImage};
use wren_common::image::LoadedImage;
use wren_css::{ColorValue, DamageRegion, DisplayList, ItemKind, Rect};

use crate::font_metrics::load_system_font;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// An RGBA pixel buffer that display lists are executed into.
pub struct Surface {
    buffer: RgbaImage,
    width: u32,
    height: u32,
    font: Option<Font>,
    images: HashMap<String, LoadedImage>,
    clip: Option<Vec<Rect>>,
}

impl Surface {
    /// A white surface of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let font = load_system_font();
        if font.is_none() {
            wren_common::warning::warn_once(
                "paint",
                "no system font found; text will not be rasterized",
            );
        }
        Self {
            buffer: ImageBuffer::from_pixel(width, height, WHITE),
            width,
            height,
            font,
            images: HashMap::new(),
            clip: None,
        }
    }

    /// Register a decoded image under its display-list lookup key.
    pub fn set_image(&mut self, src: &str, image: LoadedImage) {
        let _ = self.images.insert(src.to_string(), image);
    }

    /// Execute a display list.
    ///
    /// With `damage` present, only pixels inside the damaged rectangles
    /// change: they are cleared to the background and every intersecting
    /// item is redrawn, clipped. With `damage` absent the whole surface is
    /// repainted. `scroll` maps document coordinates to surface pixels.
    pub fn present(
        &mut self,
        list: &DisplayList,
        damage: Option<&DamageRegion>,
        scroll: (f32, f32),
    ) {
        match damage {
            Some(region) => {
                if region.is_empty() {
                    return;
                }
                let rects: Vec<Rect> = region
                    .rects
                    .iter()
                    .map(|rect| rect.translated(-scroll.0, -scroll.1))
                    .collect();
                self.clip = Some(rects.clone());
                for rect in &rects {
                    self.fill_rect(*rect, WHITE);
                }
                let bounds = damage_bounds(&rects);
                for item in &list.items {
                    if item.bounds.translated(-scroll.0, -scroll.1).intersects(&bounds) {
                        self.execute(item, scroll);
                    }
                }
                self.clip = None;
            }
            None => {
                self.buffer = ImageBuffer::from_pixel(self.width, self.height, WHITE);
                for item in &list.items {
                    self.execute(item, scroll);
                }
            }
        }
    }

    /// Save the surface as a PNG (or any format `image` infers from the
    /// extension).
    ///
    /// # Errors
    /// Returns an error if the buffer cannot be written to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.buffer
            .save(path)
            .map_err(|e| anyhow::anyhow!("failed to save frame to '{}': {e}", path.display()))?;
        Ok(())
    }

    /// The pixel at `(x, y)`, RGBA.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    fn execute(&mut self, item: &wren_css::DisplayItem, scroll: (f32, f32)) {
        let bounds = item.bounds.translated(-scroll.0, -scroll.1);
        match &item.kind {
            ItemKind::Rect { color } => {
                self.fill_rect(bounds, to_rgba(*color));
            }
            ItemKind::Text {
                text,
                font_size,
                color,
            } => {
                self.draw_text(text, bounds.x, bounds.y, *font_size, *color);
            }
            ItemKind::Image { src } => {
                self.draw_image(src, bounds);
            }
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn fill_rect(&mut self, rect: Rect, rgba: Rgba<u8>) {
        let x = rect.x as i32;
        let y = rect.y as i32;
        let width = rect.width.max(0.0) as u32;
        let height = rect.height.max(0.0) as u32;

        for dy in 0..height {
            for dx in 0..width {
                self.put(x + dx as i32, y + dy as i32, rgba);
            }
        }
    }

    /// Blit an image scaled to `bounds` with nearest-neighbor sampling,
    /// alpha-blending partially transparent source pixels.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn draw_image(&mut self, src: &str, bounds: Rect) {
        let Some(img) = self.images.get(src) else {
            return;
        };
        let img = img.clone();

        let dest_x = bounds.x as i32;
        let dest_y = bounds.y as i32;
        let dest_w = bounds.width.max(0.0) as u32;
        let dest_h = bounds.height.max(0.0) as u32;
        let src_w = img.width();
        let src_h = img.height();
        if src_w == 0 || src_h == 0 || dest_w == 0 || dest_h == 0 {
            return;
        }

        for dy in 0..dest_h {
            for dx in 0..dest_w {
                let sx = ((u64::from(dx) * u64::from(src_w)) / u64::from(dest_w))
                    .min(u64::from(src_w) - 1) as u32;
                let sy = ((u64::from(dy) * u64::from(src_h)) / u64::from(dest_h))
                    .min(u64::from(src_h) - 1) as u32;
                let idx = ((sy * src_w + sx) * 4) as usize;

                let data = img.rgba_data();
                let fg = Rgba([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
                if fg[3] == 0 {
                    continue;
                }
                self.blend(dest_x + dx as i32, dest_y + dy as i32, fg, fg[3]);
            }
        }
    }

    /// Rasterize and draw one run of text with its top-left at `(x, y)`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: ColorValue) {
        // Taken out for the duration of the run so glyph blending can
        // borrow the buffer mutably.
        let Some(font) = self.font.take() else {
            return;
        };
        let rgba = to_rgba(color);
        let mut cursor_x = x;

        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let (metrics, bitmap) = font.rasterize(ch, font_size);
            let glyph_x = cursor_x as i32 + metrics.xmin;
            let glyph_y = y as i32 + (font_size as i32 - metrics.ymin - metrics.height as i32);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = bitmap[gy * metrics.width + gx];
                    if alpha > 0 {
                        self.blend(glyph_x + gx as i32, glyph_y + gy as i32, rgba, alpha);
                    }
                }
            }
            cursor_x += metrics.advance_width;
        }
        self.font = Some(font);
    }

    /// Write one pixel, subject to bounds and the active damage clip.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn put(&mut self, px: i32, py: i32, rgba: Rgba<u8>) {
        if px < 0 || py < 0 {
            return;
        }
        let (px, py) = (px as u32, py as u32);
        if px >= self.width || py >= self.height || !self.in_clip(px, py) {
            return;
        }
        self.buffer.put_pixel(px, py, rgba);
    }

    /// Alpha-blend one pixel onto the buffer, subject to the same clip.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn blend(&mut self, px: i32, py: i32, fg: Rgba<u8>, alpha: u8) {
        if px < 0 || py < 0 {
            return;
        }
        let (ux, uy) = (px as u32, py as u32);
        if ux >= self.width || uy >= self.height || !self.in_clip(ux, uy) {
            return;
        }
        if alpha == 255 {
            self.buffer.put_pixel(ux, uy, fg);
            return;
        }
        let bg = *self.buffer.get_pixel(ux, uy);
        self.buffer.put_pixel(ux, uy, alpha_blend(fg, bg, alpha));
    }

    #[allow(clippy::cast_precision_loss)]
    fn in_clip(&self, px: u32, py: u32) -> bool {
        self.clip.as_ref().is_none_or(|rects| {
            let (x, y) = (px as f32, py as f32);
            rects
                .iter()
                .any(|r| x >= r.x && x < r.right() && y >= r.y && y < r.bottom())
        })
    }
}

fn damage_bounds(rects: &[Rect]) -> Rect {
    rects
        .iter()
        .fold(Rect::default(), |acc, rect| acc.union(rect))
}

const fn to_rgba(color: ColorValue) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

/// Blend `fg` over `bg` with coverage `alpha`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn alpha_blend(fg: Rgba<u8>, bg: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    let a = f32::from(alpha) / 255.0;
    let inv_a = 1.0 - a;
    Rgba([
        f32::from(fg[0]).mul_add(a, f32::from(bg[0]) * inv_a) as u8,
        f32::from(fg[1]).mul_add(a, f32::from(bg[1]) * inv_a) as u8,
        f32::from(fg[2]).mul_add(a, f32::from(bg[2]) * inv_a) as u8,
        255,
    ])
}
