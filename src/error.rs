//! Error types shared by the atlas, the rendering surfaces and the font facade.

use thiserror::Error;

use crate::source::PixelFormat;

/// Failures reported by a [`RenderContext`](crate::render::RenderContext).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The surface refused to hand out another texture object.
    #[error("texture creation refused: {0}")]
    TextureUnavailable(String),
    #[error("unknown texture id {0}")]
    UnknownTexture(u64),
}

/// Failures reported by a glyph bitmap source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterizeError {
    #[error("failed to load font: {0}")]
    FontLoad(String),
    #[error("glyph image is malformed: {0}")]
    MalformedImage(String),
    #[error("glyph bitmap is {found:?} but the font was opened as {expected:?}")]
    FormatMismatch {
        expected: PixelFormat,
        found: PixelFormat,
    },
}

/// Errors surfaced by [`Font`](crate::Font) operations.
#[derive(Debug, Error)]
pub enum FontError {
    /// Input text is not valid UTF-8. `offset` is the byte index of the first bad sequence.
    #[error("invalid UTF-8 in text at byte {offset}")]
    Encoding { offset: usize },

    /// A single glyph does not fit on an empty atlas page. This is a
    /// configuration error (page size too small for the font) and is not
    /// recoverable by retrying.
    #[error(
        "glyph U+{codepoint:04X} ({width}x{height}) does not fit on a \
         {page_width}x{page_height} atlas page"
    )]
    GlyphTooLarge {
        codepoint: u32,
        width: u32,
        height: u32,
        page_width: u32,
        page_height: u32,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Rasterize(#[from] RasterizeError),
}

/// Failures reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed for {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config is not valid RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("config could not be serialized: {0}")]
    Serialize(#[from] ron::Error),
}

impl From<std::str::Utf8Error> for FontError {
    fn from(err: std::str::Utf8Error) -> Self {
        FontError::Encoding {
            offset: err.valid_up_to(),
        }
    }
}

/// Decodes `bytes` as UTF-8, mapping failures to [`FontError::Encoding`].
pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<&str, FontError> {
    Ok(std::str::from_utf8(bytes)?)
}
