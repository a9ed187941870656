//! On-demand glyph atlas and text layout.
//!
//! Glyphs are rasterized the first time they are measured or drawn, packed
//! onto fixed-size texture pages with a shelf allocator, and replayed from
//! the page on every later draw. On top of the atlas, [`Font`] provides width
//! queries, greedy word wrap and transformed multi-line printing.

pub mod atlas;
pub mod config;
pub mod error;
pub mod font;
pub mod render;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConfigError, FontError, RasterizeError, RenderError};
pub use font::{Font, FontKind, FontOptions, PrintParams, WrappedText};
