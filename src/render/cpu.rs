//! Software [`RenderContext`]: textures in memory, quads rasterized into a
//! `0x00RRGGBB` pixel buffer that can be handed straight to softbuffer.

use std::collections::HashMap;

use kurbo::{Affine, Point};

use super::{FilterMode, Rect, RenderContext, TextureDesc, TextureId, TransformStack, Vertex};
use crate::error::RenderError;
use crate::source::PixelFormat;

struct CpuTexture {
    desc: TextureDesc,
    data: Vec<u8>,
}

impl CpuTexture {
    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let bpp = self.desc.format.bytes_per_pixel();
        let i = (y as usize * self.desc.width as usize + x as usize) * bpp;
        let px = &self.data[i..i + bpp];
        match self.desc.format {
            PixelFormat::LuminanceAlpha => {
                let l = px[0] as f32 / 255.0;
                [l, l, l, px[1] as f32 / 255.0]
            }
            PixelFormat::Rgba => [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
                px[3] as f32 / 255.0,
            ],
        }
    }

    fn sample(&self, s: f64, t: f64, mode: FilterMode) -> [f32; 4] {
        let w = self.desc.width;
        let h = self.desc.height;
        let u = s * w as f64;
        let v = t * h as f64;
        match mode {
            FilterMode::Nearest => {
                let x = (u.floor().max(0.0) as u32).min(w - 1);
                let y = (v.floor().max(0.0) as u32).min(h - 1);
                self.texel(x, y)
            }
            FilterMode::Linear => {
                let u = u - 0.5;
                let v = v - 0.5;
                let fx = (u - u.floor()) as f32;
                let fy = (v - v.floor()) as f32;
                let clamp_x = |x: f64| (x.max(0.0) as u32).min(w - 1);
                let clamp_y = |y: f64| (y.max(0.0) as u32).min(h - 1);
                let (x0, x1) = (clamp_x(u.floor()), clamp_x(u.floor() + 1.0));
                let (y0, y1) = (clamp_y(v.floor()), clamp_y(v.floor() + 1.0));
                let (a, b) = (self.texel(x0, y0), self.texel(x1, y0));
                let (c, d) = (self.texel(x0, y1), self.texel(x1, y1));
                let mut out = [0.0; 4];
                for i in 0..4 {
                    let top = a[i] + (b[i] - a[i]) * fx;
                    let bottom = c[i] + (d[i] - c[i]) * fx;
                    out[i] = top + (bottom - top) * fy;
                }
                out
            }
        }
    }
}

/// Blends `src` over `dst` with the given alpha, both `0x00RRGGBB`.
fn blend_rgb(dst: u32, src: u32, alpha: u8) -> u32 {
    if alpha == 255 {
        return src;
    }
    if alpha == 0 {
        return dst;
    }

    let a = alpha as u32;
    let inv = 255 - a;

    let dr = (dst >> 16) & 0xFF;
    let dg = (dst >> 8) & 0xFF;
    let db = dst & 0xFF;

    let sr = (src >> 16) & 0xFF;
    let sg = (src >> 8) & 0xFF;
    let sb = src & 0xFF;

    let r = (sr * a + dr * inv + 127) / 255;
    let g = (sg * a + dg * inv + 127) / 255;
    let b = (sb * a + db * inv + 127) / 255;

    (r << 16) | (g << 8) | b
}

/// CPU-side rendering context.
pub struct CpuContext {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    textures: HashMap<TextureId, CpuTexture>,
    next_id: u64,
    texture_limit: Option<usize>,
    bound: Option<TextureId>,
    stack: TransformStack,
    color: [u8; 4],
    quads_drawn: usize,
}

impl CpuContext {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            textures: HashMap::new(),
            next_id: 1,
            texture_limit: None,
            bound: None,
            stack: TransformStack::default(),
            color: [255, 255, 255, 255],
            quads_drawn: 0,
        }
    }

    /// Refuses texture creation once `limit` textures are alive.
    pub fn with_texture_limit(mut self, limit: usize) -> Self {
        self.texture_limit = Some(limit);
        self
    }

    pub fn set_texture_limit(&mut self, limit: Option<usize>) {
        self.texture_limit = limit;
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height];
    }

    pub fn clear(&mut self, rgb: u32) {
        self.pixels.fill(rgb & 0x00FF_FFFF);
    }

    /// Tint applied to every drawn texel, straight RGBA.
    pub fn set_color(&mut self, color: [u8; 4]) {
        self.color = color;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_desc(&self, id: TextureId) -> Option<TextureDesc> {
        self.textures.get(&id).map(|t| t.desc)
    }

    pub fn texture_data(&self, id: TextureId) -> Option<&[u8]> {
        self.textures.get(&id).map(|t| t.data.as_slice())
    }

    pub fn bound_texture(&self) -> Option<TextureId> {
        self.bound
    }

    pub fn quads_drawn(&self) -> usize {
        self.quads_drawn
    }

    pub fn transform_depth(&self) -> usize {
        self.stack.depth()
    }
}

impl RenderContext for CpuContext {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RenderError> {
        if let Some(limit) = self.texture_limit
            && self.textures.len() >= limit
        {
            return Err(RenderError::TextureUnavailable(format!(
                "texture limit of {limit} reached"
            )));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::TextureUnavailable(format!(
                "zero-sized texture {}x{}",
                desc.width, desc.height
            )));
        }
        let id = TextureId(self.next_id);
        self.next_id += 1;
        let len = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel();
        self.textures.insert(
            id,
            CpuTexture {
                desc: *desc,
                data: vec![0; len],
            },
        );
        Ok(id)
    }

    fn upload(&mut self, texture: TextureId, region: Rect, data: &[u8]) -> Result<(), RenderError> {
        let tex = self
            .textures
            .get_mut(&texture)
            .ok_or(RenderError::UnknownTexture(texture.0))?;
        let bpp = tex.desc.format.bytes_per_pixel();
        let row_bytes = region.w as usize * bpp;
        let stride = tex.desc.width as usize * bpp;
        if region.right() > tex.desc.width
            || region.bottom() > tex.desc.height
            || data.len() < row_bytes * region.h as usize
        {
            tracing::warn!(?region, len = data.len(), "upload outside texture bounds ignored");
            return Ok(());
        }
        for row in 0..region.h as usize {
            let dst = (region.y as usize + row) * stride + region.x as usize * bpp;
            let src = row * row_bytes;
            tex.data[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
        }
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        if self.bound == Some(texture) {
            self.bound = None;
        }
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound = Some(texture);
    }

    fn push_transform(&mut self, transform: Affine) {
        self.stack.push(transform);
    }

    fn pop_transform(&mut self) {
        self.stack.pop();
    }

    fn transform(&self) -> Affine {
        self.stack.current()
    }

    fn draw_quad(&mut self, quad: &[Vertex; 4]) {
        let Some(tex) = self.bound.and_then(|id| self.textures.get(&id)) else {
            tracing::trace!("draw_quad without a bound texture");
            return;
        };
        self.quads_drawn += 1;

        let (a, c) = (quad[0], quad[2]);
        let (x0, y0, x1, y1) = (a.x as f64, a.y as f64, c.x as f64, c.y as f64);
        if x0 == x1 || y0 == y1 || self.width == 0 || self.height == 0 {
            return;
        }

        let m = self.stack.current();
        let det = m.determinant();
        if det.abs() < 1e-12 {
            return;
        }
        let inv = m.inverse();
        // Magnifying when a local unit covers more than one pixel.
        let mode = if det.abs() >= 1.0 {
            tex.desc.filter.mag
        } else {
            tex.desc.filter.min
        };

        let corners = [
            m * Point::new(x0, y0),
            m * Point::new(x1, y0),
            m * Point::new(x1, y1),
            m * Point::new(x0, y1),
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let px_start = min_x.floor().max(0.0) as usize;
        let py_start = min_y.floor().max(0.0) as usize;
        let px_end = (max_x.ceil().max(0.0) as usize).min(self.width);
        let py_end = (max_y.ceil().max(0.0) as usize).min(self.height);

        let tint = self.color.map(|c| c as f32 / 255.0);
        for py in py_start..py_end {
            for px in px_start..px_end {
                let local = inv * Point::new(px as f64 + 0.5, py as f64 + 0.5);
                let u = (local.x - x0) / (x1 - x0);
                let v = (local.y - y0) / (y1 - y0);
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let s = a.s as f64 + u * (c.s as f64 - a.s as f64);
                let t = a.t as f64 + v * (c.t as f64 - a.t as f64);
                let texel = tex.sample(s, t, mode);
                let alpha = (texel[3] * tint[3] * 255.0).round().clamp(0.0, 255.0) as u8;
                if alpha == 0 {
                    continue;
                }
                let channel =
                    |i: usize| (texel[i] * tint[i] * 255.0).round().clamp(0.0, 255.0) as u32;
                let src = (channel(0) << 16) | (channel(1) << 8) | channel(2);
                let idx = py * self.width + px;
                self.pixels[idx] = blend_rgb(self.pixels[idx], src, alpha);
            }
        }
    }
}
