//! User preference accessors over the key-value store.
//!
//! Covers the non-history part of the key space: response language, theme,
//! and the first-run flag.

use mathmate_core::error::Result;
use mathmate_core::storage::{FIRST_RUN_KEY, KeyValueStore, LANGUAGE_KEY, THEME_KEY};
use std::sync::Arc;

/// Default response language when none is stored.
pub const DEFAULT_LANGUAGE: &str = "English";
/// Default theme when none is stored.
pub const DEFAULT_THEME: &str = "system";

/// Typed preference accessors.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the preferred response language.
    pub fn language(&self) -> String {
        self.store
            .get(LANGUAGE_KEY)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }

    pub fn set_language(&self, language: &str) -> Result<()> {
        self.store.set(LANGUAGE_KEY, language)
    }

    /// Returns the UI theme preference.
    pub fn theme(&self) -> String {
        self.store
            .get(THEME_KEY)
            .unwrap_or_else(|| DEFAULT_THEME.to_string())
    }

    pub fn set_theme(&self, theme: &str) -> Result<()> {
        self.store.set(THEME_KEY, theme)
    }

    /// True until [`Preferences::mark_first_run_done`] has been called.
    pub fn is_first_run(&self) -> bool {
        self.store.get(FIRST_RUN_KEY).is_none()
    }

    pub fn mark_first_run_done(&self) -> Result<()> {
        self.store.set(FIRST_RUN_KEY, "done")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_store::FileKeyValueStore;
    use tempfile::TempDir;

    fn preferences(dir: &TempDir) -> Preferences {
        Preferences::new(Arc::new(FileKeyValueStore::new(dir.path())))
    }

    #[test]
    fn test_language_default_and_roundtrip() {
        let dir = TempDir::new().unwrap();
        let prefs = preferences(&dir);

        assert_eq!(prefs.language(), DEFAULT_LANGUAGE);

        prefs.set_language("Norsk").unwrap();
        assert_eq!(prefs.language(), "Norsk");
    }

    #[test]
    fn test_first_run_flag() {
        let dir = TempDir::new().unwrap();
        let prefs = preferences(&dir);

        assert!(prefs.is_first_run());
        prefs.mark_first_run_done().unwrap();
        assert!(!prefs.is_first_run());
    }

    #[test]
    fn test_theme_roundtrip() {
        let dir = TempDir::new().unwrap();
        let prefs = preferences(&dir);

        assert_eq!(prefs.theme(), DEFAULT_THEME);
        prefs.set_theme("dark").unwrap();
        assert_eq!(prefs.theme(), "dark");
    }
}
