//! wgpu-backed [`RenderContext`].
//!
//! Quads are transformed on the CPU and queued into per-texture batches.
//! Nothing reaches the GPU until [`GpuContext::flush`] encodes every queued
//! batch into a single render pass.

mod pipeline;

use std::collections::HashMap;

use kurbo::{Affine, Point};
use wgpu::util::DeviceExt;

pub use pipeline::GpuVertex;
use pipeline::{GlyphPipeline, ViewportUniforms, create_glyph_pipeline};

use super::{FilterMode, Rect, RenderContext, TextureDesc, TextureId, TransformStack, Vertex};
use crate::error::RenderError;
use crate::source::PixelFormat;

struct GpuTexture {
    desc: TextureDesc,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// A contiguous run of vertices drawn from one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Batch {
    texture: TextureId,
    start: u32,
    count: u32,
}

pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: GlyphPipeline,
    viewport_buffer: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,
    textures: HashMap<TextureId, GpuTexture>,
    next_id: u64,
    bound: Option<TextureId>,
    stack: TransformStack,
    color: [f32; 4],
    vertices: Vec<GpuVertex>,
    batches: Vec<Batch>,
}

fn texture_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::LuminanceAlpha => wgpu::TextureFormat::Rg8Unorm,
        PixelFormat::Rgba => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    }
}

/// Expands a quad into two triangles, mapping corners through `m`.
fn triangulate(
    m: Affine,
    quad: &[Vertex; 4],
    color: [f32; 4],
    format: PixelFormat,
) -> [GpuVertex; 6] {
    let luminance_alpha = match format {
        PixelFormat::LuminanceAlpha => 1.0,
        PixelFormat::Rgba => 0.0,
    };
    let corner = |v: &Vertex| {
        let p = m * Point::new(v.x as f64, v.y as f64);
        GpuVertex {
            position: [p.x as f32, p.y as f32],
            uv: [v.s, v.t],
            color,
            luminance_alpha,
        }
    };
    let [a, b, c, d] = quad.each_ref().map(corner);
    [a, b, c, a, c, d]
}

impl GpuContext {
    /// Builds the glyph pipeline for a render target of `format`.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let pipeline = create_glyph_pipeline(&device, format);
        let viewport_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glyph_viewport"),
            size: std::mem::size_of::<ViewportUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph_viewport_bind_group"),
            layout: &pipeline.viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });
        Self {
            device,
            queue,
            pipeline,
            viewport_buffer,
            viewport_bind_group,
            textures: HashMap::new(),
            next_id: 1,
            bound: None,
            stack: TransformStack::default(),
            color: [1.0; 4],
            vertices: Vec::new(),
            batches: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let uniforms = ViewportUniforms {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
            _pad: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.viewport_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Tint applied to subsequently drawn quads, straight RGBA.
    pub fn set_color(&mut self, color: [u8; 4]) {
        self.color = color.map(|c| c as f32 / 255.0);
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Encodes every queued quad into one render pass targeting `view`.
    pub fn flush(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
    ) {
        let vertex_buffer = (!self.vertices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("glyph_vertices"),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glyph_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if let Some(vertex_buffer) = &vertex_buffer {
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.viewport_bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            for batch in &self.batches {
                let Some(tex) = self.textures.get(&batch.texture) else {
                    continue;
                };
                render_pass.set_bind_group(1, &tex.bind_group, &[]);
                render_pass.draw(batch.start..batch.start + batch.count, 0..1);
            }
        }
        drop(render_pass);

        self.vertices.clear();
        self.batches.clear();
    }

    fn queue_quad(&mut self, texture: TextureId, vertices: [GpuVertex; 6]) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&vertices);
        match self.batches.last_mut() {
            Some(batch) if batch.texture == texture => batch.count += 6,
            _ => self.batches.push(Batch {
                texture,
                start,
                count: 6,
            }),
        }
    }
}

impl RenderContext for GpuContext {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId, RenderError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(RenderError::TextureUnavailable(format!(
                "{}x{} outside device limit of {max}",
                desc.width, desc.height
            )));
        }

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let format = texture_format(desc.format);
        let bpp = desc.format.bytes_per_pixel();
        // Start transparent so padding never samples stale memory.
        let zeroed = vec![0u8; desc.width as usize * desc.height as usize * bpp];
        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("glyph_page"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &zeroed,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph_page_sampler"),
            mag_filter: filter_mode(desc.filter.mag),
            min_filter: filter_mode(desc.filter.min),
            ..Default::default()
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph_page_bind_group"),
            layout: &self.pipeline.page_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            id,
            GpuTexture {
                desc: *desc,
                texture,
                bind_group,
            },
        );
        Ok(id)
    }

    fn upload(&mut self, texture: TextureId, region: Rect, data: &[u8]) -> Result<(), RenderError> {
        let tex = self
            .textures
            .get(&texture)
            .ok_or(RenderError::UnknownTexture(texture.0))?;
        let bpp = tex.desc.format.bytes_per_pixel() as u32;
        let row_bytes = region.w * bpp;
        if region.right() > tex.desc.width
            || region.bottom() > tex.desc.height
            || data.len() < (row_bytes * region.h) as usize
        {
            tracing::warn!(?region, len = data.len(), "upload outside texture bounds ignored");
            return Ok(());
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row_bytes),
                rows_per_image: Some(region.h),
            },
            wgpu::Extent3d {
                width: region.w,
                height: region.h,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(tex) = self.textures.remove(&texture) {
            tex.texture.destroy();
        }
        self.batches.retain(|b| b.texture != texture);
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
        let Some((id, format)) = self
            .bound
            .and_then(|id| self.textures.get(&id).map(|t| (id, t.desc.format)))
        else {
            tracing::trace!("draw_quad without a bound texture");
            return;
        };
        let vertices = triangulate(self.stack.current(), quad, self.color, format);
        self.queue_quad(id, vertices);
    }
}
