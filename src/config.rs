//! Locating and reading the editor config file.
//!
//! Lives at `$XDG_CONFIG_HOME/figdraw/config.json`, falling back to
//! `~/.config/figdraw/config.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figdraw_core::EditorConfig;
use tracing::warn;

/// Get the config file path
pub fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
    config_dir.join("figdraw").join("config.json")
}

/// Load from the default location, falling back to defaults on any problem
pub fn load() -> EditorConfig {
    let path = config_path();
    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "using default editor config");
            EditorConfig::default()
        }
    }
}

/// Load from `path`. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<EditorConfig> {
    if !path.exists() {
        return Ok(EditorConfig::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
    let config: EditorConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {:?}", path))?;
    Ok(config)
}
