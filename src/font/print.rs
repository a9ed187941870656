use kurbo::Affine;

use super::{Font, FontKind};
use crate::error::{FontError, decode_utf8};
use crate::render::{RenderContext, TransformScope, print_transform};

/// Placement of a printed string: position, rotation, scale, origin and shear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintParams {
    pub x: f32,
    pub y: f32,
    /// Rotation in radians.
    pub angle: f32,
    pub sx: f32,
    pub sy: f32,
    pub ox: f32,
    pub oy: f32,
    pub kx: f32,
    pub ky: f32,
}

impl Default for PrintParams {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

impl PrintParams {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            sx: 1.0,
            sy: 1.0,
            ox: 0.0,
            oy: 0.0,
            kx: 0.0,
            ky: 0.0,
        }
    }

    pub fn rotated(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn scaled(mut self, sx: f32, sy: f32) -> Self {
        self.sx = sx;
        self.sy = sy;
        self
    }

    pub fn origin(mut self, ox: f32, oy: f32) -> Self {
        self.ox = ox;
        self.oy = oy;
        self
    }

    pub fn sheared(mut self, kx: f32, ky: f32) -> Self {
        self.kx = kx;
        self.ky = ky;
        self
    }

    pub fn transform(&self) -> Affine {
        print_transform(
            self.x, self.y, self.angle, self.sx, self.sy, self.ox, self.oy, self.kx, self.ky,
        )
    }
}

/// Rounds half up, matching how the pen snaps to whole pixels.
fn round_half_up(v: f32) -> f64 {
    (v + 0.5).floor() as f64
}

impl Font {
    /// Draws `text` under the transform described by `params`.
    ///
    /// `'\n'` moves the pen down by `ceil(height × line_height)` and back to
    /// the left edge. Between glyphs the pen advances by each glyph's raw
    /// advance; [`spacing`](Font::spacing) only affects measurement.
    ///
    /// Invalid UTF-8 fails before anything is drawn. The context's transform
    /// is restored on every return path.
    pub fn print(
        &mut self,
        ctx: &mut dyn RenderContext,
        text: impl AsRef<[u8]>,
        params: &PrintParams,
    ) -> Result<(), FontError> {
        let mut scope = TransformScope::push(ctx, params.transform());
        let text = decode_utf8(text.as_ref())?;

        let line_advance = (self.height() * self.line_height).ceil() as f64;
        // Outline glyphs hang from the baseline; image glyphs from the top.
        let ascent = match self.kind {
            FontKind::Outline => round_half_up(self.height() / 1.25),
            FontKind::Image => 0.0,
        };

        let (mut pen_x, mut pen_y) = (0.0_f64, 0.0_f64);
        for ch in text.chars() {
            if ch == '\n' {
                pen_x = 0.0;
                pen_y += line_advance;
                continue;
            }
            let glyph = self.glyph(scope.context(), ch)?;
            let offset = Affine::translate((pen_x, pen_y + ascent));
            let mut at = TransformScope::push(scope.context(), offset);
            glyph.draw(at.context());
            drop(at);
            pen_x += glyph.advance() as f64;
        }
        Ok(())
    }

    /// Draws a single character with its top-left pen position at `(x, y)`,
    /// without the rotation/scale/shear machinery of [`print`](Font::print).
    pub fn print_char(
        &mut self,
        ctx: &mut dyn RenderContext,
        ch: char,
        x: f32,
        y: f32,
    ) -> Result<(), FontError> {
        let glyph = self.glyph(ctx, ch)?;
        let baseline = round_half_up(y + self.height());
        let mut at = TransformScope::push(ctx, Affine::translate((x as f64, baseline)));
        glyph.draw(at.context());
        Ok(())
    }
}
