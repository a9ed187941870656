use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::render::{Filter, Rect, RenderContext, TextureDesc, TextureId};
use crate::source::PixelFormat;

pub const DEFAULT_PAGE_SIZE: u32 = 512;
pub const DEFAULT_PADDING: u32 = 1;

/// Dimensions shared by every page of one atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    /// Margin kept free after every glyph so bilinear sampling never bleeds
    /// into a neighbour.
    pub padding: u32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_PAGE_SIZE,
            height: DEFAULT_PAGE_SIZE,
            padding: DEFAULT_PADDING,
        }
    }
}

impl PageLayout {
    /// Whether a `w × h` glyph fits on an empty page.
    pub fn fits_empty(&self, w: u32, h: u32) -> bool {
        w.saturating_add(self.padding * 2) <= self.width
            && h.saturating_add(self.padding * 2) <= self.height
    }
}

/// Shelf packer: rows filled left to right, a new row starts below the
/// tallest glyph of the current one. Never backtracks or repacks.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    layout: PageLayout,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl ShelfPacker {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            cursor_x: layout.padding,
            cursor_y: layout.padding,
            row_height: layout.padding,
        }
    }

    /// Places a `w × h` rectangle, or returns `None` when the page is out of
    /// rows. A `None` means the caller needs a fresh page.
    pub fn try_allocate(&mut self, w: u32, h: u32) -> Option<Rect> {
        let pad = self.layout.padding;
        if self.cursor_x + w + pad > self.layout.width {
            self.cursor_x = pad;
            self.cursor_y += self.row_height;
            self.row_height = pad;
        }
        if self.cursor_y + h + pad > self.layout.height {
            return None;
        }
        let rect = Rect::new(self.cursor_x, self.cursor_y, w, h);
        self.cursor_x += w + pad;
        self.row_height = self.row_height.max(h + pad);
        Some(rect)
    }

    pub fn cursor(&self) -> (u32, u32, u32) {
        (self.cursor_x, self.cursor_y, self.row_height)
    }
}

/// The texture half of a page, shared by every glyph drawn from it.
#[derive(Debug, PartialEq, Eq)]
pub struct PageTexture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// One fixed-size texture plus its packing cursor.
#[derive(Debug)]
pub struct AtlasPage {
    texture: Rc<PageTexture>,
    packer: ShelfPacker,
}

impl AtlasPage {
    pub fn create(
        ctx: &mut dyn RenderContext,
        layout: PageLayout,
        format: PixelFormat,
        filter: Filter,
    ) -> Result<Self, RenderError> {
        let id = ctx.create_texture(&TextureDesc {
            width: layout.width,
            height: layout.height,
            format,
            filter,
        })?;
        Ok(Self {
            texture: Rc::new(PageTexture {
                id,
                width: layout.width,
                height: layout.height,
                format,
            }),
            packer: ShelfPacker::new(layout),
        })
    }

    pub fn texture(&self) -> &Rc<PageTexture> {
        &self.texture
    }

    pub fn try_allocate(&mut self, w: u32, h: u32) -> Option<Rect> {
        self.packer.try_allocate(w, h)
    }

    pub fn upload(
        &self,
        ctx: &mut dyn RenderContext,
        rect: Rect,
        data: &[u8],
    ) -> Result<(), RenderError> {
        ctx.upload(self.texture.id, rect, data)
    }

    pub(crate) fn destroy(self, ctx: &mut dyn RenderContext) {
        ctx.delete_texture(self.texture.id);
    }
}
