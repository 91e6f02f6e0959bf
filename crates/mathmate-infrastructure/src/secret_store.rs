//! Secret configuration (API keys) stored in secret.json.
//!
//! Loading order: the `GEMINI_API_KEY` environment variable wins; otherwise
//! the `gemini` section of `~/.config/mathmate/secret.json` is used. A
//! missing key is a `Config` error raised before any remote call.

use crate::paths::MathMatePaths;
use mathmate_core::error::{MathMateError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the stored API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini credentials and optional model override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiSecret {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Root shape of secret.json.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiSecret>,
}

/// Loads and resolves secret configuration.
pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    /// Creates a store reading from the default secret file location.
    pub fn at_default_location() -> Result<Self> {
        let path = MathMatePaths::secret_file()
            .map_err(|e| MathMateError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    /// Creates a store reading from an explicit path (used in tests).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads secret.json. A missing file reads as the empty config; an
    /// unreadable or unparseable file is a `Config` error. The error
    /// message never contains secret values.
    pub fn load(&self) -> Result<SecretConfig> {
        if !self.path.exists() {
            return Ok(SecretConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            MathMateError::config(format!("Failed to read secret file at {:?}: {}", self.path, e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            MathMateError::config(format!(
                "Failed to parse secret file at {:?}: {}",
                self.path, e
            ))
        })
    }

    /// Resolves the Gemini credentials, preferring the environment.
    ///
    /// # Errors
    ///
    /// `Config` if neither the environment variable nor secret.json carries
    /// an API key.
    pub fn resolve_gemini(&self) -> Result<GeminiSecret> {
        if let Ok(key) = std::env::var(GEMINI_API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(GeminiSecret {
                    api_key: key,
                    model: self.load()?.gemini.and_then(|g| g.model),
                });
            }
        }

        self.load()?.gemini.filter(|g| !g.api_key.trim().is_empty()).ok_or_else(|| {
            MathMateError::config(
                "No Gemini API key configured: set GEMINI_API_KEY or add a 'gemini' section to secret.json",
            )
        })
    }

    /// Path of the secret file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
