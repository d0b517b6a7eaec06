//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the cache TTL and the signed-in user.
//!
//! Configuration is stored at `~/.config/leavedesk/config.json`. Values from
//! the environment (or a `.env` file) take precedence:
//!
//! - `LEAVEDESK_API_URL`: API base URL
//! - `LEAVEDESK_API_TOKEN`: bearer token, never written to disk
//! - `LEAVEDESK_CACHE_TTL`: cache freshness window in seconds

use std::path::PathBuf;

use anyhow::{Context, Result};
use leavedesk_core::cache::DEFAULT_TTL_SECS;
use leavedesk_core::User;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for the config directory path
const APP_NAME: &str = "leavedesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

fn default_ttl() -> i64 {
    DEFAULT_TTL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default = "default_ttl")]
    pub cache_ttl_secs: i64,
    pub user: Option<User>,
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            cache_ttl_secs: DEFAULT_TTL_SECS,
            user: None,
            api_token: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Overlay environment variables on the loaded file
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("LEAVEDESK_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = lookup("LEAVEDESK_API_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.api_token = Some(token);
        }
        if let Some(ttl) = lookup("LEAVEDESK_CACHE_TTL") {
            match ttl.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => self.cache_ttl_secs = secs,
                _ => warn!(value = %ttl, "Ignoring invalid LEAVEDESK_CACHE_TTL"),
            }
        }
    }

    pub fn base_url(&self) -> Result<&str> {
        self.api_base_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No API URL configured. \
                 Run `leavedesk config set-url <URL>` or set LEAVEDESK_API_URL"
            )
        })
    }

    pub fn current_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No user configured. Run `leavedesk config set-user --id <ID> --name <NAME>`"
            )
        })
    }
}
