use std::path::Path;

use fontdue::{Font, FontSettings};

use super::{GlyphBitmap, GlyphBitmapSource, PixelFormat};
use crate::error::RasterizeError;

/// Outline font rasterized on the CPU with fontdue.
///
/// Coverage is emitted as white luminance with the coverage in alpha, so the
/// pages tint cleanly with any text color.
pub struct FontdueSource {
    font: Font,
    px_size: f32,
    height: i32,
}

impl FontdueSource {
    pub fn from_bytes(data: &[u8], px_size: f32) -> Result<Self, RasterizeError> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| RasterizeError::FontLoad(e.to_string()))?;
        let px_size = px_size.max(1.0);
        // Fonts without horizontal metrics fall back to the pixel size.
        let height = font
            .horizontal_line_metrics(px_size)
            .map(|m| m.new_line_size.round() as i32)
            .unwrap_or(px_size.round() as i32);
        Ok(Self {
            font,
            px_size,
            height,
        })
    }

    pub fn from_path(path: &Path, px_size: f32) -> Result<Self, RasterizeError> {
        let data = std::fs::read(path)
            .map_err(|e| RasterizeError::FontLoad(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&data, px_size)
    }

    pub fn px_size(&self) -> f32 {
        self.px_size
    }
}

impl GlyphBitmapSource for FontdueSource {
    fn height(&self) -> i32 {
        self.height
    }

    fn rasterize(&self, ch: char) -> Result<GlyphBitmap, RasterizeError> {
        let (metrics, coverage) = self.font.rasterize(ch, self.px_size);
        let mut data = Vec::with_capacity(coverage.len() * 2);
        for alpha in coverage {
            data.push(0xFF);
            data.push(alpha);
        }
        Ok(GlyphBitmap {
            width: metrics.width as u32,
            height: metrics.height as u32,
            format: PixelFormat::LuminanceAlpha,
            advance: metrics.advance_width.round() as i32,
            bearing_x: metrics.xmin,
            bearing_y: metrics.ymin + metrics.height as i32,
            data,
        })
    }
}
