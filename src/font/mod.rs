//! The font facade: owns a glyph source and its atlas, and exposes the
//! measuring, wrapping and printing operations.
//!
//! Measuring is not side-effect free. Any operation that needs a glyph's
//! advance creates the glyph on the atlas first, which is why every method
//! here takes the [`RenderContext`] the pages live in.

mod metrics;
mod print;
mod wrap;

use std::rc::Rc;

pub use print::PrintParams;
pub use wrap::WrappedText;

use crate::atlas::{CompiledGlyph, GlyphAtlasCache, PageLayout};
use crate::error::FontError;
use crate::render::{Filter, RenderContext};
use crate::source::{GlyphBitmapSource, PixelFormat};

/// Where a font's glyphs come from. Fixed for the lifetime of the font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Rasterized from outlines; grayscale-alpha pages.
    Outline,
    /// Pre-rendered bitmaps; RGBA pages.
    Image,
}

impl FontKind {
    fn from_format(format: PixelFormat) -> Self {
        match format {
            PixelFormat::LuminanceAlpha => FontKind::Outline,
            PixelFormat::Rgba => FontKind::Image,
        }
    }
}

/// Construction-time settings for the atlas behind a [`Font`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontOptions {
    pub layout: PageLayout,
    pub filter: Filter,
}

pub struct Font {
    source: Rc<dyn GlyphBitmapSource>,
    cache: GlyphAtlasCache,
    kind: FontKind,
    height: i32,
    line_height: f32,
    spacing: f32,
}

impl Font {
    /// Opens a font over `source`, rasterizing the space glyph to decide the
    /// font kind. The first atlas page is provisioned and the space glyph is
    /// packed on it, so it is never rasterized twice.
    pub fn new(
        ctx: &mut dyn RenderContext,
        source: Rc<dyn GlyphBitmapSource>,
        options: FontOptions,
    ) -> Result<Self, FontError> {
        let space = source.rasterize(' ')?;
        let kind = FontKind::from_format(space.format);
        let height = source.height();
        let mut cache = GlyphAtlasCache::new(options.layout, space.format, options.filter);
        cache.provision_page(ctx)?;
        cache.insert_bitmap(ctx, ' ', &space)?;
        tracing::debug!(?kind, height, "font opened");
        Ok(Self {
            source,
            cache,
            kind,
            height,
            line_height: 1.0,
            spacing: 1.0,
        })
    }

    pub fn kind(&self) -> FontKind {
        self.kind
    }

    /// Nominal font height in pixels.
    pub fn height(&self) -> f32 {
        self.height as f32
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Multiplier applied to [`height`](Self::height) when a newline is printed.
    pub fn set_line_height(&mut self, multiplier: f32) {
        self.line_height = multiplier;
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Multiplier applied to glyph advances when measuring.
    pub fn set_spacing(&mut self, multiplier: f32) {
        self.spacing = multiplier;
    }

    /// Returns the compiled glyph for `ch`, creating it on the atlas if needed.
    pub fn glyph(
        &mut self,
        ctx: &mut dyn RenderContext,
        ch: char,
    ) -> Result<Rc<CompiledGlyph>, FontError> {
        self.cache.get_or_create(ctx, self.source.as_ref(), ch)
    }

    pub fn atlas(&self) -> &GlyphAtlasCache {
        &self.cache
    }

    /// Drops every page and glyph, e.g. after the GPU device was lost. The
    /// font stays usable; call [`recreate_resources`](Self::recreate_resources)
    /// once the surface is back.
    pub fn release_resources(&mut self, ctx: &mut dyn RenderContext) {
        self.cache.release(ctx);
        tracing::info!("font resources released");
    }

    /// Provisions a fresh empty page if the atlas has none. Glyphs come back
    /// lazily on next use, and repeated calls add no pages.
    pub fn recreate_resources(&mut self, ctx: &mut dyn RenderContext) -> Result<(), FontError> {
        if self.cache.page_count() == 0 {
            self.cache.provision_page(ctx)?;
        }
        tracing::info!("font resources recreated");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/font.rs"]
mod tests;
