//! Infrastructure layer: file-backed persistence, secrets, preferences,
//! and path management.

pub mod file_store;
pub mod paths;
pub mod preferences;
pub mod secret_store;

pub use file_store::FileKeyValueStore;
pub use paths::MathMatePaths;
pub use preferences::Preferences;
pub use secret_store::{GEMINI_API_KEY_ENV, GeminiSecret, SecretConfig, SecretStore};
