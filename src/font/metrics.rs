use super::Font;
use crate::error::{FontError, decode_utf8};
use crate::render::RenderContext;

impl Font {
    /// Advance of one character scaled by [`spacing`](Font::spacing),
    /// truncated to whole pixels. Creates the glyph if it is not cached yet.
    pub fn char_width(&mut self, ctx: &mut dyn RenderContext, ch: char) -> Result<i32, FontError> {
        let glyph = self.glyph(ctx, ch)?;
        Ok((glyph.advance() as f32 * self.spacing) as i32)
    }

    /// Sum of [`char_width`](Font::char_width) over every codepoint of `text`.
    ///
    /// Fails with [`FontError::Encoding`] before measuring anything if `text`
    /// is not valid UTF-8.
    pub fn width(
        &mut self,
        ctx: &mut dyn RenderContext,
        text: impl AsRef<[u8]>,
    ) -> Result<i32, FontError> {
        let text = decode_utf8(text.as_ref())?;
        self.str_width(ctx, text)
    }

    pub(super) fn str_width(
        &mut self,
        ctx: &mut dyn RenderContext,
        text: &str,
    ) -> Result<i32, FontError> {
        let mut total = 0;
        for ch in text.chars() {
            total += self.char_width(ctx, ch)?;
        }
        Ok(total)
    }
}
