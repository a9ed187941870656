use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::atlas::{DEFAULT_PADDING, DEFAULT_PAGE_SIZE, PageLayout};
use crate::font::FontOptions;
use crate::render::Filter;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub font: FontConfig,
    pub atlas: AtlasConfig,
    pub viewer: ViewerConfig,
}

impl AppConfig {
    /// Atlas settings for fonts opened from this config.
    pub fn font_options(&self) -> FontOptions {
        FontOptions {
            layout: self.atlas.layout(),
            filter: self.font.filter,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TrueType/OpenType file to rasterize. `None` uses the first system
    /// font the viewer can find.
    pub path: Option<PathBuf>,
    pub size: f32,
    pub line_height: f32,
    pub spacing: f32,
    pub filter: Filter,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            size: 16.0,
            line_height: 1.0,
            spacing: 1.0,
            filter: Filter::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub page_width: u32,
    pub page_height: u32,
    pub padding: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_SIZE,
            page_height: DEFAULT_PAGE_SIZE,
            padding: DEFAULT_PADDING,
        }
    }
}

impl AtlasConfig {
    pub fn layout(&self) -> PageLayout {
        PageLayout {
            width: self.page_width,
            height: self.page_height,
            padding: self.padding,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub sample_text: String,
    pub wrap_width: f32,
    pub backend: BackendKind,
    /// `0xRRGGBB`.
    pub background: u32,
    /// `0xRRGGBB`.
    pub foreground: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            sample_text: "The quick brown fox jumps over the lazy dog.\n\
                          Pack my box with five dozen liquor jugs.\n\n\
                          Press R to drop and rebuild the glyph atlas."
                .to_owned(),
            wrap_width: 480.0,
            backend: BackendKind::Auto,
            background: 0x1E1E2E,
            foreground: 0xCDD6F4,
            width: 640,
            height: 400,
        }
    }
}

/// Which rendering surface the viewer asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BackendKind {
    /// GPU when available, otherwise the software surface.
    #[default]
    Auto,
    Gpu,
    Cpu,
}
