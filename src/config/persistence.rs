use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;
use crate::error::ConfigError;

/// Returns the platform-specific base config directory.
///
/// Resolution order:
/// 1. `XDG_CONFIG_HOME`
/// 2. `$HOME/.config`
/// 3. `%USERPROFILE%/.config`
pub fn config_base_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg));
    }
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home).join(".config"));
    }
    std::env::var_os("USERPROFILE").map(|home| PathBuf::from(home).join(".config"))
}

/// Returns the path to `~/.config/glyphweave/config.ron`.
pub fn config_path() -> Option<PathBuf> {
    config_base_dir().map(|base| base.join("glyphweave").join("config.ron"))
}

/// Loads the config from the default location.
///
/// A missing file yields the defaults silently; an unreadable or malformed
/// one yields the defaults with a warning.
pub fn load_config() -> AppConfig {
    let Some(path) = config_path() else {
        return AppConfig::default();
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return AppConfig::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring config file");
            AppConfig::default()
        }
    }
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ron::from_str(&contents)?)
}

/// Writes `config` as pretty RON, creating parent directories as needed.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let serialized = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())?;
    fs::write(path, serialized).map_err(io_err)
}
