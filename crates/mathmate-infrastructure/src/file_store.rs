//! File-backed key-value store.
//!
//! Each key is one plain-text file under the store directory. Reads are
//! best-effort: an unreadable or missing file is a `None`, never an error.

use crate::paths::MathMatePaths;
use mathmate_core::error::{MathMateError, Result};
use mathmate_core::storage::KeyValueStore;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// [`KeyValueStore`] implementation storing one file per key.
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a store rooted at the default platform location
    /// (`~/.config/mathmate/store/` on Linux).
    pub fn at_default_location() -> Result<Self> {
        let root = MathMatePaths::store_dir()
            .map_err(|e| MathMateError::config(e.to_string()))?;
        Ok(Self::new(root))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|e| {
                MathMateError::data_access(format!(
                    "Failed to create store directory at {:?}: {}",
                    self.root, e
                ))
            })?;
        }

        let path = self.key_path(key);
        debug!(?path, "writing store key");
        fs::write(&path, value).map_err(|e| {
            MathMateError::data_access(format!("Failed to write key '{}' at {:?}: {}", key, path, e))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MathMateError::data_access(format!(
                "Failed to remove key '{}' at {:?}: {}",
                key, path, e
            ))),
        }
    }
}
