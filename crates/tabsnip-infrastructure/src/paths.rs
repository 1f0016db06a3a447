//! Unified path management for tabsnip files.
//!
//! All paths are resolved via the platform directories from the `dirs`
//! crate, so the layout is consistent across Linux, macOS, and Windows.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for tabsnip.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/tabsnip/           # Config directory
/// └── config.toml              # Runtime timing configuration
///
/// ~/.local/share/tabsnip/      # Data directory
/// └── slot/                    # Persisted screenshot slot
///     ├── screenshot.png
///     └── screenshot.toml
/// ```
pub struct TabsnipPaths;

impl TabsnipPaths {
    /// Returns the tabsnip configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/tabsnip/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("tabsnip"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the tabsnip data directory, used for the screenshot slot.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to data directory (e.g., `~/.local/share/tabsnip/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("tabsnip"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the directory holding the persisted screenshot slot.
    pub fn slot_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("slot"))
    }
}
