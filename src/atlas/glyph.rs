use std::rc::Rc;

use super::page::PageTexture;
use crate::render::{Rect, RenderContext, Vertex};
use crate::source::GlyphBitmap;

/// A glyph that has been placed on an atlas page and can be redrawn without
/// touching the rasterizer again.
///
/// The quad already carries the bearing offset, so replaying it at the pen
/// position puts the bitmap where the font expects it.
#[derive(Debug)]
pub struct CompiledGlyph {
    page: Rc<PageTexture>,
    rect: Rect,
    advance: i32,
    bearing_x: i32,
    bearing_y: i32,
    quad: [Vertex; 4],
}

impl CompiledGlyph {
    pub(crate) fn compile(page: Rc<PageTexture>, rect: Rect, bitmap: &GlyphBitmap) -> Self {
        let (pw, ph) = (page.width as f32, page.height as f32);
        let s0 = rect.x as f32 / pw;
        let t0 = rect.y as f32 / ph;
        let s1 = rect.right() as f32 / pw;
        let t1 = rect.bottom() as f32 / ph;

        let dx = bitmap.bearing_x as f32;
        let dy = -bitmap.bearing_y as f32;
        let (w, h) = (rect.w as f32, rect.h as f32);
        let quad = [
            Vertex { x: dx, y: dy, s: s0, t: t0 },
            Vertex { x: dx, y: dy + h, s: s0, t: t1 },
            Vertex { x: dx + w, y: dy + h, s: s1, t: t1 },
            Vertex { x: dx + w, y: dy, s: s1, t: t0 },
        ];

        Self {
            page,
            rect,
            advance: bitmap.advance,
            bearing_x: bitmap.bearing_x,
            bearing_y: bitmap.bearing_y,
            quad,
        }
    }

    /// Replays the glyph at the context's current transform.
    pub fn draw(&self, ctx: &mut dyn RenderContext) {
        if self.rect.w == 0 || self.rect.h == 0 {
            return;
        }
        ctx.bind_texture(self.page.id);
        ctx.draw_quad(&self.quad);
    }

    pub fn page(&self) -> &Rc<PageTexture> {
        &self.page
    }

    /// Pixel rectangle on the page.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn advance(&self) -> i32 {
        self.advance
    }

    pub fn bearing(&self) -> (i32, i32) {
        (self.bearing_x, self.bearing_y)
    }

    pub fn quad(&self) -> &[Vertex; 4] {
        &self.quad
    }
}
