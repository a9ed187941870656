//! Interactive preview window: renders the configured sample text through
//! the atlas on whichever backend is available.
//!
//! Keys: `R` drops every atlas texture and rebuilds it, `Esc` quits.

mod backend;

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use softbuffer::Context;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, OwnedDisplayHandle};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use glyphweave::config::{AppConfig, FontConfig};
use glyphweave::source::{FontdueSource, GlyphBitmapSource};
use glyphweave::{Font, PrintParams};

use self::backend::Backend;

const MARGIN: f32 = 16.0;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Opens the configured font file, or the first known system font.
fn open_source(config: &FontConfig) -> anyhow::Result<FontdueSource> {
    let path: PathBuf = match &config.path {
        Some(path) => path.clone(),
        None => match SYSTEM_FONTS.iter().map(Path::new).find(|p| p.exists()) {
            Some(path) => path.to_path_buf(),
            None => bail!(
                "no font configured and no system font found; set font.path in the config"
            ),
        },
    };
    let source = FontdueSource::from_path(&path, config.size)
        .with_context(|| format!("loading font {}", path.display()))?;
    tracing::info!(path = %path.display(), size = config.size, "font source opened");
    Ok(source)
}

struct ViewerWindow {
    window: Arc<Window>,
    backend: Backend,
    font: Font,
}

impl ViewerWindow {
    fn draw(&mut self, config: &AppConfig) -> anyhow::Result<()> {
        let size = self.window.inner_size();
        let viewer = &config.viewer;
        self.backend
            .begin_frame(size.width, size.height, viewer.background);
        self.backend.set_color(viewer.foreground);

        let ctx = self.backend.context();
        let wrapped = self.font.wrap(ctx, &viewer.sample_text, viewer.wrap_width)?;
        let line_advance = (self.font.height() * self.font.line_height()).ceil();
        for (i, line) in wrapped.lines.iter().enumerate() {
            let params = PrintParams::at(MARGIN, MARGIN + i as f32 * line_advance);
            self.font.print(ctx, line, &params)?;
        }

        let status = format!(
            "{} backend | {} glyphs on {} pages | widest line {}px",
            self.backend.name(),
            self.font.atlas().glyph_count(),
            self.font.atlas().page_count(),
            wrapped.max_width,
        );
        let ctx = self.backend.context();
        let status_y = size.height as f32 - MARGIN - self.font.height();
        self.font
            .print(ctx, &status, &PrintParams::at(MARGIN, status_y).scaled(0.75, 0.75))?;

        self.backend.present(viewer.background)
    }

    /// Simulates losing the rendering context: every page is dropped and
    /// glyphs are re-rasterized on the next frame.
    fn rebuild_atlas(&mut self) -> anyhow::Result<()> {
        let ctx = self.backend.context();
        self.font.release_resources(ctx);
        self.font
            .recreate_resources(ctx)
            .context("recreating atlas pages")?;
        Ok(())
    }
}

struct Viewer {
    config: AppConfig,
    source: Rc<dyn GlyphBitmapSource>,
    context: Option<Context<OwnedDisplayHandle>>,
    window: Option<ViewerWindow>,
    error: Option<anyhow::Error>,
}

impl Viewer {
    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<ViewerWindow> {
        let context = Context::new(event_loop.owned_display_handle())
            .map_err(|err| anyhow::anyhow!("softbuffer context: {err}"))?;
        let context = self.context.insert(context);

        let attributes = Window::default_attributes()
            .with_title("glyphweave")
            .with_inner_size(LogicalSize::new(
                self.config.viewer.width,
                self.config.viewer.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("creating window")?,
        );

        let mut backend = Backend::new(window.clone(), context, self.config.viewer.backend)?;
        let mut font = Font::new(
            backend.context(),
            self.source.clone(),
            self.config.font_options(),
        )?;
        font.set_line_height(self.config.font.line_height);
        font.set_spacing(self.config.font.spacing);

        Ok(ViewerWindow {
            window,
            backend,
            font,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match self.open_window(event_loop) {
            Ok(win) => {
                win.window.request_redraw();
                self.window = Some(win);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(win) = self.window.as_mut() else {
            return;
        };
        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(_) => {
                win.window.request_redraw();
                Ok(())
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match logical_key {
                Key::Named(NamedKey::Escape) => {
                    event_loop.exit();
                    Ok(())
                }
                Key::Character(c) if c.eq_ignore_ascii_case("r") => {
                    let result = win.rebuild_atlas();
                    win.window.request_redraw();
                    result
                }
                _ => Ok(()),
            },
            WindowEvent::RedrawRequested => win.draw(&self.config),
            _ => Ok(()),
        };
        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }
}

/// Opens the viewer window and blocks until it is closed.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let source = open_source(&config.font)?;
    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut app = Viewer {
        config,
        source: Rc::new(source),
        context: None,
        window: None,
        error: None,
    };
    event_loop.run_app(&mut app).context("running event loop")?;
    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
