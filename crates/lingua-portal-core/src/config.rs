//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URLs, the durable token backend, and the
//! last used login email.
//!
//! Configuration is stored at `~/.config/lingua-portal/config.json`.
//! `LINGUA_PORTAL_API_URL` and `LINGUA_PORTAL_CONTACT_URL` override the
//! stored URLs.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "lingua-portal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Separately hosted contact form endpoint
pub const DEFAULT_CONTACT_FORM_URL: &str = "http://localhost:3001/contact";

pub const API_URL_ENV: &str = "LINGUA_PORTAL_API_URL";
pub const CONTACT_URL_ENV: &str = "LINGUA_PORTAL_CONTACT_URL";

/// Where "remember me" tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// JSON file in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub contact_form_url: Option<String>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend base URL: environment, then config file, then default.
    pub fn api_base_url(&self) -> String {
        Self::resolve(API_URL_ENV, self.api_base_url.as_deref(), DEFAULT_API_BASE_URL)
    }

    pub fn contact_form_url(&self) -> String {
        Self::resolve(CONTACT_URL_ENV, self.contact_form_url.as_deref(), DEFAULT_CONTACT_FORM_URL)
    }

    fn resolve(env_key: &str, configured: Option<&str>, default: &str) -> String {
        std::env::var(env_key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| configured.map(str::to_string))
            .unwrap_or_else(|| default.to_string())
            .trim_end_matches('/')
            .to_string()
    }
}
