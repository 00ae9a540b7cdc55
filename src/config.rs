use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional `config.toml`. Every field falls back to a CLI flag, an env var,
/// or a built-in default.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,

    /// Provider identifier: "deepseek", "google" or "stub".
    pub provider: Option<String>,

    /// Model name; each provider has its own default.
    pub model: Option<String>,

    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,

    /// Upstream request timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Replaces the built-in system instruction.
    pub system_prompt: Option<String>,

    /// Comma-separated list of allowed CORS origins. Unset allows any origin.
    pub cors_origins: Option<String>,

    pub deepseek: ProviderConfig,
    pub google: ProviderConfig,
}

#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
}

// Keep keys out of the startup debug log.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Config {
    /// Load config if the file exists, otherwise return Ok(None).
    pub fn load_optional(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("failed to read config: {}", path.display()))
            }
        };

        let s = String::from_utf8(bytes).context("config is not valid UTF-8")?;
        let cfg: Config = toml::from_str(&s)
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;
        Ok(Some(cfg))
    }
}
