// Configuration: where the backend lives and how patient the client is.
// Values come from built-in defaults, then an optional TOML file, then the
// `TUNEFINDER_API_URL` environment variable, then command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "tunefinder_config.toml";

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "TUNEFINDER_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunefinderConfig {
    /// Base URL of the API gateway stage, e.g. `https://abc.execute-api.../prod`.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Linear backoff unit in milliseconds.
    pub backoff_unit_ms: u64,
}

impl Default for TunefinderConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".into(),
            request_timeout_secs: 30,
            backoff_unit_ms: 1000,
        }
    }
}

impl TunefinderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    /// Parse a config from TOML text. Missing keys fall back to defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: TunefinderConfig = toml::from_str(text).context("Parsing config TOML")?;
        Ok(cfg)
    }

    /// Load configuration. An explicit `path` must exist; the default file
    /// is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let data = fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {}", p.display()))?;
                Self::from_toml(&data)?
            }
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if p.is_file() {
                    let data = fs::read_to_string(&p)
                        .with_context(|| format!("Failed to read config file {}", p.display()))?;
                    Self::from_toml(&data)?
                } else {
                    tracing::info!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        cfg.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(cfg)
    }

    /// Replace the base URL when `value` is set and non-empty.
    pub fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    /// Base URL with any trailing slash removed, ready for `{base}/path`.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }
}
