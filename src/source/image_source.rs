use std::collections::HashMap;

use super::{GlyphBitmap, GlyphBitmapSource, PixelFormat};
use crate::error::RasterizeError;

/// Straight-alpha RGBA pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Result<Self, RasterizeError> {
        if pixels.len() != (width as usize) * (height as usize) {
            return Err(RasterizeError::MalformedImage(format!(
                "expected {} pixels for {width}x{height}, got {}",
                width as usize * height as usize,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }
}

#[derive(Debug, Clone, Copy)]
struct Strip {
    x: u32,
    width: u32,
}

/// Pre-rendered bitmap font: one image row of glyphs separated by spacer columns.
///
/// The top-left pixel defines the spacer color. Glyphs are assigned to the
/// `glyphs` string in order; a glyph's advance is its pixel width.
pub struct ImageGlyphSource {
    image: RgbaImage,
    spacer: [u8; 4],
    strips: HashMap<char, Strip>,
}

impl ImageGlyphSource {
    pub fn new(image: RgbaImage, glyphs: &str) -> Result<Self, RasterizeError> {
        if image.width == 0 || image.height == 0 {
            return Err(RasterizeError::MalformedImage("image is empty".into()));
        }
        let spacer = image.pixel(0, 0);
        let mut strips = HashMap::new();
        let mut end = 0;
        for ch in glyphs.chars() {
            let mut start = end;
            while start < image.width && image.pixel(start, 0) == spacer {
                start += 1;
            }
            end = start;
            while end < image.width && image.pixel(end, 0) != spacer {
                end += 1;
            }
            if start >= end {
                tracing::warn!(
                    glyph = %ch,
                    "image font ran out of glyph strips before the glyph list ended"
                );
                break;
            }
            strips.insert(
                ch,
                Strip {
                    x: start,
                    width: end - start,
                },
            );
        }
        Ok(Self {
            image,
            spacer,
            strips,
        })
    }

    pub fn glyph_count(&self) -> usize {
        self.strips.len()
    }
}

impl GlyphBitmapSource for ImageGlyphSource {
    fn height(&self) -> i32 {
        self.image.height as i32
    }

    fn rasterize(&self, ch: char) -> Result<GlyphBitmap, RasterizeError> {
        let Some(strip) = self.strips.get(&ch) else {
            return Ok(GlyphBitmap::empty(PixelFormat::Rgba, 0));
        };
        let mut data = Vec::with_capacity((strip.width * self.image.height * 4) as usize);
        for y in 0..self.image.height {
            for x in strip.x..strip.x + strip.width {
                let px = self.image.pixel(x, y);
                if px == self.spacer {
                    data.extend_from_slice(&[0, 0, 0, 0]);
                } else {
                    data.extend_from_slice(&px);
                }
            }
        }
        Ok(GlyphBitmap {
            width: strip.width,
            height: self.image.height,
            format: PixelFormat::Rgba,
            advance: strip.width as i32,
            bearing_x: 0,
            bearing_y: 0,
            data,
        })
    }
}
