//! Image data types shared across pipeline stages.
//!
//! A replaced box is laid out against the decoded image's intrinsic size, and
//! the paint surface blits the same pixel data, so the container lives here
//! rather than in either stage.

use crate::net::FetchError;

/// Decoded image data for a loaded image resource.
///
/// Contains the decoded RGBA pixel data and intrinsic dimensions.
#[derive(Clone)]
pub struct LoadedImage {
    /// Intrinsic width of the image in pixels.
    width: u32,
    /// Intrinsic height of the image in pixels.
    height: u32,
    /// Raw RGBA pixel data (width * height * 4 bytes).
    rgba_data: Vec<u8>,
}

impl LoadedImage {
    /// Create a new `LoadedImage` from decoded RGBA pixel data.
    ///
    /// `rgba_data` must be `width * height * 4` bytes.
    #[must_use]
    pub const fn new(width: u32, height: u32, rgba_data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba_data,
        }
    }

    /// Decode raw encoded bytes (PNG/JPEG) into a `LoadedImage`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError::Body`] if the bytes are not a decodable image.
    pub fn decode(bytes: &[u8]) -> Result<Self, FetchError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| FetchError::Body(format!("image decode error: {e}")))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self::new(width, height, decoded.into_raw()))
    }

    /// Intrinsic width of the image in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic height of the image in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Intrinsic dimensions as `(width, height)` in `f32`, for layout.
    #[must_use]
    pub fn dimensions_f32(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Raw RGBA pixel data.
    #[must_use]
    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }
}
