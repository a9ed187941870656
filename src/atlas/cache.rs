use std::collections::HashMap;
use std::rc::Rc;

use super::glyph::CompiledGlyph;
use super::page::{AtlasPage, PageLayout, PageTexture};
use crate::error::{FontError, RasterizeError, RenderError};
use crate::render::{Filter, RenderContext};
use crate::source::{GlyphBitmap, GlyphBitmapSource, PixelFormat};

/// Codepoint → compiled glyph map backed by an append-only list of pages.
///
/// The last page is the only one that receives new glyphs. Entries are
/// never evicted; the whole cache is dropped at once by [`release`](Self::release).
pub struct GlyphAtlasCache {
    layout: PageLayout,
    format: PixelFormat,
    filter: Filter,
    pages: Vec<AtlasPage>,
    glyphs: HashMap<char, Rc<CompiledGlyph>>,
}

impl GlyphAtlasCache {
    /// An empty cache. No texture exists until [`provision_page`](Self::provision_page)
    /// or the first glyph request.
    pub fn new(layout: PageLayout, format: PixelFormat, filter: Filter) -> Self {
        Self {
            layout,
            format,
            filter,
            pages: Vec::new(),
            glyphs: HashMap::new(),
        }
    }

    /// Appends a fresh page and makes it the write target.
    pub fn provision_page(&mut self, ctx: &mut dyn RenderContext) -> Result<(), RenderError> {
        let page = AtlasPage::create(ctx, self.layout, self.format, self.filter)?;
        tracing::debug!(
            texture = page.texture().id.0,
            pages = self.pages.len() + 1,
            width = self.layout.width,
            height = self.layout.height,
            "atlas page provisioned"
        );
        self.pages.push(page);
        Ok(())
    }

    /// Returns the cached glyph without creating it.
    pub fn get(&self, ch: char) -> Option<Rc<CompiledGlyph>> {
        self.glyphs.get(&ch).cloned()
    }

    /// Returns the glyph for `ch`, rasterizing and uploading it on first use.
    ///
    /// A miss calls `source` exactly once. When the current page is out of
    /// rows a new page is provisioned; a glyph that would not fit even on an
    /// empty page is rejected with [`FontError::GlyphTooLarge`].
    pub fn get_or_create(
        &mut self,
        ctx: &mut dyn RenderContext,
        source: &dyn GlyphBitmapSource,
        ch: char,
    ) -> Result<Rc<CompiledGlyph>, FontError> {
        if let Some(glyph) = self.glyphs.get(&ch) {
            return Ok(Rc::clone(glyph));
        }

        let bitmap = source.rasterize(ch)?;
        self.insert_bitmap(ctx, ch, &bitmap)
    }

    /// Packs an already rasterized `bitmap` as the glyph for `ch`, replacing
    /// any earlier entry. Later lookups of `ch` hit the cache.
    pub fn insert_bitmap(
        &mut self,
        ctx: &mut dyn RenderContext,
        ch: char,
        bitmap: &GlyphBitmap,
    ) -> Result<Rc<CompiledGlyph>, FontError> {
        if bitmap.format != self.format {
            return Err(RasterizeError::FormatMismatch {
                expected: self.format,
                found: bitmap.format,
            }
            .into());
        }
        let layout = self.layout;
        let too_large = || FontError::GlyphTooLarge {
            codepoint: ch as u32,
            width: bitmap.width,
            height: bitmap.height,
            page_width: layout.width,
            page_height: layout.height,
        };
        if !layout.fits_empty(bitmap.width, bitmap.height) {
            let err = too_large();
            tracing::error!(%err, "atlas page size is too small for this font");
            return Err(err);
        }

        if self.pages.is_empty() {
            self.provision_page(ctx)?;
        }
        let rect = match self.current_page_mut().try_allocate(bitmap.width, bitmap.height) {
            Some(rect) => rect,
            None => {
                self.provision_page(ctx)?;
                self.current_page_mut()
                    .try_allocate(bitmap.width, bitmap.height)
                    .ok_or_else(too_large)?
            }
        };

        let page = self.current_page_mut();
        if !bitmap.is_empty() {
            page.upload(ctx, rect, &bitmap.data)?;
        }
        let glyph = Rc::new(CompiledGlyph::compile(
            Rc::clone(page.texture()),
            rect,
            bitmap,
        ));
        tracing::trace!(
            codepoint = ch as u32,
            page = self.pages.len() - 1,
            x = rect.x,
            y = rect.y,
            w = rect.w,
            h = rect.h,
            "glyph added to atlas"
        );
        self.glyphs.insert(ch, Rc::clone(&glyph));
        Ok(glyph)
    }

    /// Deletes every page texture and forgets every glyph.
    pub fn release(&mut self, ctx: &mut dyn RenderContext) {
        let pages = self.pages.len();
        let glyphs = self.glyphs.len();
        self.glyphs.clear();
        for page in self.pages.drain(..) {
            page.destroy(ctx);
        }
        tracing::debug!(pages, glyphs, "atlas released");
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Page textures in creation order; the last one is the write target.
    pub fn pages(&self) -> impl Iterator<Item = &Rc<PageTexture>> {
        self.pages.iter().map(AtlasPage::texture)
    }

    fn current_page_mut(&mut self) -> &mut AtlasPage {
        // Callers provision a page before asking for the current one.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/atlas_cache.rs"]
mod tests;
