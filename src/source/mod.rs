//! Glyph bitmap sources: anything that can turn a codepoint into pixels.
//!
//! The atlas never rasterizes on its own. It asks a [`GlyphBitmapSource`]
//! exactly once per distinct codepoint and keeps the result on a GPU page.

mod fontdue_source;
mod image_source;

pub use fontdue_source::FontdueSource;
pub use image_source::{ImageGlyphSource, RgbaImage};

use crate::error::RasterizeError;

/// Pixel layout of a glyph bitmap and of every atlas page built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Two bytes per pixel: luminance then alpha.
    LuminanceAlpha,
    /// Four bytes per pixel, straight alpha.
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::LuminanceAlpha => 2,
            PixelFormat::Rgba => 4,
        }
    }
}

/// One rasterized glyph. Consumed by the atlas during a single allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Horizontal pen displacement in pixels.
    pub advance: i32,
    /// Offset from the pen position to the left edge of the bitmap.
    pub bearing_x: i32,
    /// Distance from the baseline up to the top edge of the bitmap.
    pub bearing_y: i32,
    /// Row-major pixels, `width * height * format.bytes_per_pixel()` bytes.
    pub data: Vec<u8>,
}

impl GlyphBitmap {
    /// A zero-sized bitmap that only carries an advance.
    pub fn empty(format: PixelFormat, advance: i32) -> Self {
        Self {
            width: 0,
            height: 0,
            format,
            advance,
            bearing_x: 0,
            bearing_y: 0,
            data: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Turns codepoints into glyph bitmaps.
///
/// Implementations must return the same [`PixelFormat`] for every glyph; the
/// font probes it once with the space character and fixes its page format
/// from the answer.
pub trait GlyphBitmapSource {
    /// Nominal line height of the font in pixels.
    fn height(&self) -> i32;

    fn rasterize(&self, ch: char) -> Result<GlyphBitmap, RasterizeError>;
}
