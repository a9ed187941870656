mod model;
mod persistence;

pub use model::{AppConfig, AtlasConfig, BackendKind, FontConfig, ViewerConfig};
pub use persistence::{config_base_dir, config_path, load_config, load_config_from, save_config_to};
