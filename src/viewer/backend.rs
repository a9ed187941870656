use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Context as _;
use softbuffer::Surface;
use winit::event_loop::OwnedDisplayHandle;
use winit::window::Window;

use glyphweave::config::BackendKind;
use glyphweave::render::RenderContext;
use glyphweave::render::cpu::CpuContext;

#[cfg(feature = "gpu")]
use glyphweave::render::gpu::GpuContext;

/// Enum-dispatch rendering surface.
///
/// The software path keeps its framebuffer in a [`CpuContext`] and copies it
/// into softbuffer; the GPU path owns its own wgpu surface.
pub enum Backend {
    Cpu {
        ctx: Box<CpuContext>,
        surface: Box<Surface<OwnedDisplayHandle, Arc<Window>>>,
    },
    #[cfg(feature = "gpu")]
    Gpu(Box<GpuSurface>),
}

impl Backend {
    /// Creates the requested backend. `Auto` tries the GPU first and falls
    /// back to the software surface.
    pub fn new(
        window: Arc<Window>,
        context: &softbuffer::Context<OwnedDisplayHandle>,
        kind: BackendKind,
    ) -> anyhow::Result<Self> {
        #[cfg(feature = "gpu")]
        if kind != BackendKind::Cpu {
            match GpuSurface::new(window.clone()) {
                Ok(gpu) => {
                    tracing::info!("using GPU backend (wgpu)");
                    return Ok(Backend::Gpu(Box::new(gpu)));
                }
                Err(err) if kind == BackendKind::Gpu => return Err(err),
                Err(err) => tracing::warn!(%err, "GPU backend failed, falling back to CPU"),
            }
        }
        #[cfg(not(feature = "gpu"))]
        if kind == BackendKind::Gpu {
            tracing::warn!("built without the gpu feature, using CPU backend");
        }

        let surface = Surface::new(context, window.clone())
            .map_err(|err| anyhow::anyhow!("softbuffer surface: {err}"))?;
        let size = window.inner_size();
        let ctx = CpuContext::new(size.width.max(1) as usize, size.height.max(1) as usize);
        tracing::info!("using CPU backend (softbuffer)");
        Ok(Backend::Cpu {
            ctx: Box::new(ctx),
            surface: Box::new(surface),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Cpu { .. } => "cpu",
            #[cfg(feature = "gpu")]
            Backend::Gpu(_) => "gpu",
        }
    }

    pub fn context(&mut self) -> &mut dyn RenderContext {
        match self {
            Backend::Cpu { ctx, .. } => ctx.as_mut(),
            #[cfg(feature = "gpu")]
            Backend::Gpu(gpu) => &mut gpu.ctx,
        }
    }

    pub fn set_color(&mut self, rgb: u32) {
        let color = [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xFF];
        match self {
            Backend::Cpu { ctx, .. } => ctx.set_color(color),
            #[cfg(feature = "gpu")]
            Backend::Gpu(gpu) => gpu.ctx.set_color(color),
        }
    }

    /// Prepares a frame of the given size cleared to `background`.
    pub fn begin_frame(&mut self, width: u32, height: u32, background: u32) {
        match self {
            Backend::Cpu { ctx, .. } => {
                ctx.resize(width.max(1) as usize, height.max(1) as usize);
                ctx.clear(background);
            }
            #[cfg(feature = "gpu")]
            Backend::Gpu(gpu) => gpu.resize(width, height),
        }
    }

    /// Pushes the finished frame to the window.
    #[cfg_attr(not(feature = "gpu"), allow(unused_variables))]
    pub fn present(&mut self, background: u32) -> anyhow::Result<()> {
        match self {
            Backend::Cpu { ctx, surface } => {
                let (Some(w), Some(h)) = (
                    NonZeroU32::new(ctx.width() as u32),
                    NonZeroU32::new(ctx.height() as u32),
                ) else {
                    return Ok(());
                };
                surface
                    .resize(w, h)
                    .map_err(|err| anyhow::anyhow!("softbuffer resize: {err}"))?;
                let mut buffer = surface
                    .buffer_mut()
                    .map_err(|err| anyhow::anyhow!("softbuffer buffer: {err}"))?;
                buffer.copy_from_slice(ctx.pixels());
                buffer
                    .present()
                    .map_err(|err| anyhow::anyhow!("softbuffer present: {err}"))
                    .context("presenting CPU frame")
            }
            #[cfg(feature = "gpu")]
            Backend::Gpu(gpu) => {
                gpu.present(background);
                Ok(())
            }
        }
    }
}

/// wgpu surface plus the [`GpuContext`] drawing into it.
#[cfg(feature = "gpu")]
pub struct GpuSurface {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    ctx: GpuContext,
}

#[cfg(feature = "gpu")]
impl GpuSurface {
    fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("glyphweave_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        // Non-sRGB target so configured colors are written as given.
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let mut ctx = GpuContext::new(device, queue, format);
        ctx.set_viewport(width, height);
        Ok(Self {
            surface,
            surface_config,
            ctx,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        let w = width.max(1);
        let h = height.max(1);
        if w == self.surface_config.width && h == self.surface_config.height {
            return;
        }
        self.surface_config.width = w;
        self.surface_config.height = h;
        self.surface.configure(self.ctx.device(), &self.surface_config);
        self.ctx.set_viewport(w, h);
    }

    /// Acquires the surface texture, reconfiguring once on failure.
    fn acquire_surface(&mut self) -> Option<(wgpu::SurfaceTexture, wgpu::TextureView)> {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(_) => {
                self.surface.configure(self.ctx.device(), &self.surface_config);
                self.surface.get_current_texture().ok()?
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Some((output, view))
    }

    fn present(&mut self, background: u32) {
        let Some((output, view)) = self.acquire_surface() else {
            tracing::warn!("surface unavailable, frame dropped");
            return;
        };
        let mut encoder = self
            .ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        let channel = |shift: u32| ((background >> shift) & 0xFF) as f64 / 255.0;
        let clear = wgpu::Color {
            r: channel(16),
            g: channel(8),
            b: channel(0),
            a: 1.0,
        };
        self.ctx.flush(&mut encoder, &view, Some(clear));
        self.ctx.queue().submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
