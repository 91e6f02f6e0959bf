//! Unified path management for MathMate configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/mathmate/          # Config directory
//! ├── secret.json              # API keys
//! └── store/                   # Key-value store (one file per key)
//!     ├── history
//!     ├── language
//!     ├── theme
//!     └── first_run
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for MathMate.
pub struct MathMatePaths;

impl MathMatePaths {
    /// Returns the MathMate configuration directory
    /// (e.g. `~/.config/mathmate/` on Linux).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("mathmate"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the secrets file.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Returns the key-value store directory.
    pub fn store_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("store"))
    }
}
