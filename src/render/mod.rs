//! Rendering surfaces the atlas draws through.
//!
//! Texture objects, the bound texture and the transform stack all live
//! behind [`RenderContext`], which is passed explicitly into every operation
//! that touches GPU state. Two implementations ship with the crate:
//! [`cpu::CpuContext`] (software rasterization into a pixel buffer) and,
//! with the `gpu` feature, [`gpu::GpuContext`] (wgpu).

pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
mod transform;

pub use kurbo::Affine;
use serde::{Deserialize, Serialize};
pub use transform::{TransformStack, print_transform};

use crate::error::RenderError;
use crate::source::PixelFormat;

/// Opaque handle to a texture owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Pixel rectangle inside a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    Linear,
    Nearest,
}

/// Minification and magnification filters for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub min: FilterMode,
    pub mag: FilterMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: Filter,
}

/// One corner of a textured quad: position in local units, `s`/`t` in
/// normalized texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub s: f32,
    pub t: f32,
}

/// The GPU operations the glyph atlas and the font need.
///
/// Calls are executed in order on the calling thread. Quads are always
/// axis-aligned rectangles in local space with vertex 0 and vertex 2 at
/// opposite corners; the active transform maps them to the target.
pub trait RenderContext {
    /// Creates a texture cleared to transparent black.
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RenderError>;

    /// Copies tightly packed pixels into `region` of `texture`.
    fn upload(&mut self, texture: TextureId, region: Rect, data: &[u8]) -> Result<(), RenderError>;

    fn delete_texture(&mut self, texture: TextureId);

    fn bind_texture(&mut self, texture: TextureId);

    /// Saves the active transform and post-multiplies it by `transform`.
    fn push_transform(&mut self, transform: Affine);

    /// Restores the transform saved by the matching [`push_transform`](Self::push_transform).
    fn pop_transform(&mut self);

    fn transform(&self) -> Affine;

    /// Draws a quad from the bound texture under the active transform.
    fn draw_quad(&mut self, quad: &[Vertex; 4]);
}

/// Pushes a transform for as long as the scope lives.
///
/// The matching pop happens on drop, so early returns through `?` leave the
/// context's transform exactly as they found it.
pub struct TransformScope<'a> {
    ctx: &'a mut dyn RenderContext,
}

impl<'a> TransformScope<'a> {
    pub fn push(ctx: &'a mut dyn RenderContext, transform: Affine) -> Self {
        ctx.push_transform(transform);
        Self { ctx }
    }

    pub fn context(&mut self) -> &mut dyn RenderContext {
        &mut *self.ctx
    }
}

impl Drop for TransformScope<'_> {
    fn drop(&mut self) {
        self.ctx.pop_transform();
    }
}
