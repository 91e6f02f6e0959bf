//! Key-value persistence seam.
//!
//! The persistence collaborator is a synchronous best-effort string store.
//! The key space is small and fixed: the serialized history blob and the
//! user preferences.

use crate::error::Result;

/// Key holding the serialized history list.
pub const HISTORY_KEY: &str = "history";
/// Key holding the preferred response language.
pub const LANGUAGE_KEY: &str = "language";
/// Key holding the UI theme preference.
pub const THEME_KEY: &str = "theme";
/// Key holding the first-run flag.
pub const FIRST_RUN_KEY: &str = "first_run";

/// An abstract synchronous key-value store for small string blobs.
///
/// Implementations are best-effort: a missing key reads as `None`, and
/// `remove` on a missing key is a no-op.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
