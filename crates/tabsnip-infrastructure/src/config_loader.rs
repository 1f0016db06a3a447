//! Loading the runtime configuration from disk.

use std::path::Path;

use tabsnip_core::config::RuntimeConfig;
use tabsnip_core::error::{Result, SnipError};

use crate::paths::TabsnipPaths;

/// Reads `config.toml` from the platform config directory.
///
/// A missing or empty file yields the defaults; a present but malformed
/// file is an error rather than a silent fallback.
pub fn load_runtime_config() -> Result<RuntimeConfig> {
    let path = TabsnipPaths::config_file().map_err(|e| SnipError::config(e.to_string()))?;
    load_runtime_config_from(&path)
}

/// Like [`load_runtime_config`], but from an explicit path.
pub fn load_runtime_config_from(path: &Path) -> Result<RuntimeConfig> {
    if !path.exists() {
        return Ok(RuntimeConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(RuntimeConfig::default());
    }

    Ok(toml::from_str(&content)?)
}
