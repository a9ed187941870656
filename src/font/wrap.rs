use super::Font;
use crate::error::{FontError, decode_utf8};
use crate::render::RenderContext;

/// Result of [`Font::wrap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedText {
    /// One entry per rendered line, in order.
    pub lines: Vec<String>,
    /// Widest line produced, in pixels.
    pub max_width: i32,
}

impl Font {
    /// Greedy word wrap.
    ///
    /// Each `'\n'`-terminated segment is wrapped on its own. Words are runs of
    /// non-whitespace joined by single spaces; a word is moved to a new line
    /// when adding it would bring the line to `wrap_width` or beyond, unless
    /// it is the first word on the line. Words wider than `wrap_width` are
    /// kept whole and overflow.
    ///
    /// A segment stays on one line only when `wrap_width` is strictly greater
    /// than its measured width; at exactly that width the last word breaks.
    /// Word widths follow [`spacing`](Font::spacing) while the joining space
    /// counts its raw advance.
    pub fn wrap(
        &mut self,
        ctx: &mut dyn RenderContext,
        text: impl AsRef<[u8]>,
        wrap_width: f32,
    ) -> Result<WrappedText, FontError> {
        let text = decode_utf8(text.as_ref())?;
        let space = self.glyph(ctx, ' ')?.advance();

        let mut out = WrappedText::default();
        for segment in text.split_terminator('\n') {
            let mut line = String::new();
            let mut width = 0;
            for word in segment.split_ascii_whitespace() {
                let word_width = self.str_width(ctx, word)?;
                if line.is_empty() {
                    line.push_str(word);
                    width = word_width;
                    continue;
                }
                let extended = width + space + word_width;
                if extended as f32 >= wrap_width {
                    out.max_width = out.max_width.max(width);
                    out.lines.push(std::mem::take(&mut line));
                    line.push_str(word);
                    width = word_width;
                } else {
                    line.push(' ');
                    line.push_str(word);
                    width = extended;
                }
            }
            out.max_width = out.max_width.max(width);
            out.lines.push(line);
        }
        Ok(out)
    }
}
