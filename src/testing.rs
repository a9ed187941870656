//! Test doubles shared by the unit suites.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::RasterizeError;
use crate::source::{GlyphBitmap, GlyphBitmapSource, PixelFormat};

#[derive(Clone, Copy)]
struct Shape {
    width: u32,
    height: u32,
    advance: i32,
}

/// Glyph source with scripted glyph sizes that counts every rasterize call.
pub(crate) struct FakeSource {
    format: PixelFormat,
    height: i32,
    fallback: Shape,
    shapes: HashMap<char, Shape>,
    calls: RefCell<HashMap<char, usize>>,
}

impl FakeSource {
    /// Every glyph is `8 × 10` with an advance of 8 until overridden.
    pub(crate) fn new(format: PixelFormat) -> Self {
        Self {
            format,
            height: 16,
            fallback: Shape {
                width: 8,
                height: 10,
                advance: 8,
            },
            shapes: HashMap::new(),
            calls: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn outline() -> Self {
        Self::new(PixelFormat::LuminanceAlpha)
    }

    pub(crate) fn with_height(mut self, height: i32) -> Self {
        self.height = height;
        self
    }

    pub(crate) fn with_glyph(mut self, ch: char, width: u32, height: u32, advance: i32) -> Self {
        self.shapes.insert(
            ch,
            Shape {
                width,
                height,
                advance,
            },
        );
        self
    }

    pub(crate) fn with_default(mut self, width: u32, height: u32, advance: i32) -> Self {
        self.fallback = Shape {
            width,
            height,
            advance,
        };
        self
    }

    pub(crate) fn calls(&self, ch: char) -> usize {
        self.calls.borrow().get(&ch).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

impl GlyphBitmapSource for FakeSource {
    fn height(&self) -> i32 {
        self.height
    }

    fn rasterize(&self, ch: char) -> Result<GlyphBitmap, RasterizeError> {
        *self.calls.borrow_mut().entry(ch).or_default() += 1;
        let shape = self.shapes.get(&ch).copied().unwrap_or(self.fallback);
        let len = (shape.width * shape.height) as usize * self.format.bytes_per_pixel();
        Ok(GlyphBitmap {
            width: shape.width,
            height: shape.height,
            format: self.format,
            advance: shape.advance,
            bearing_x: 0,
            // Outline glyphs sit on the baseline, image glyphs hang from the pen.
            bearing_y: match self.format {
                PixelFormat::LuminanceAlpha => shape.height as i32,
                PixelFormat::Rgba => 0,
            },
            data: vec![0xFF; len],
        })
    }
}
