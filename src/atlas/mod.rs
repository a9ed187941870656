//! Glyph atlas: shelf-packed texture pages and the codepoint cache on top.

mod cache;
mod glyph;
mod page;

pub use cache::GlyphAtlasCache;
pub use glyph::CompiledGlyph;
pub use page::{AtlasPage, DEFAULT_PADDING, DEFAULT_PAGE_SIZE, PageLayout, PageTexture, ShelfPacker};
