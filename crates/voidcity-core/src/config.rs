use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "VOIDCITY_API_URL";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Upper bound on a single remote call before it is treated as a network failure.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Overrides the platform data dir location of the token file.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load config: user file (if exists) over built-in defaults, then env overrides.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        let mut config = if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            Self::parse(&user_str)?
        } else {
            Self::parse(DEFAULT_CONFIG)?
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(%url, "API base URL overridden from environment");
                config.api.base_url = url;
            }
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs.max(1))
    }

    /// Path to the persisted session token.
    pub fn token_path(&self) -> PathBuf {
        self.session.token_file.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.data_dir().join("session.json"))
                .unwrap_or_else(|| PathBuf::from("session.json"))
        })
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "voidcity")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
