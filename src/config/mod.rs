//! Configuration loading and on-disk locations

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides `base_url` from the config file.
pub const BASE_URL_ENV: &str = "PPLIP_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_PENDING: usize = 256;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API base address, every request path is appended to it
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Upper bound on requests parked while a token refresh is in flight
    pub max_pending_requests: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_pending_requests: DEFAULT_MAX_PENDING,
        }
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "pplip", "pplip")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path of the persisted credentials file
    pub fn credentials_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("credentials.toml"))
    }

    /// Load configuration from disk, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).context("Failed to read config file")?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            tracing::debug!("Using base URL from {}", BASE_URL_ENV);
            config.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    fn validate(&mut self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL '{}'", self.base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("Base URL must be http or https, got '{}'", self.base_url);
        }
        // Paths are joined as "{base}{path}" with a leading slash on the path.
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
