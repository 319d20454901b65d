use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://app.cloud66.com/api/3";

pub const ENV_API_URL: &str = "LEASECP_API_URL";
pub const ENV_TOKEN: &str = "LEASECP_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_stack: Option<String>,
    pub key_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let key_dir = dirs::home_dir()
            .map(|home| home.join(".ssh"))
            .unwrap_or_else(|| PathBuf::from(".ssh"));
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            default_stack: None,
            key_dir,
        }
    }
}

impl AppConfig {
    /// Overlay values from the environment. `lookup` is `std::env::var` in
    /// production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.access_token = Some(token);
        }
    }

    pub fn token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "No access token configured; set access_token in the config file or {}",
                    ENV_TOKEN
                ))
            })
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    config_file: PathBuf,
}

impl ConfigManager {
    /// Uses `<config dir>/leasecp/leasecp.toml`.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("Could not find config directory"))?
            .join("leasecp");
        Ok(Self::with_path(config_dir.join("leasecp.toml")))
    }

    pub fn with_path(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_file
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        // First run: write the defaults so the operator has something to edit
        if !self.config_file.exists() {
            let default_config = AppConfig::default();
            self.save_config(&default_config)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_file).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", self.config_file.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::config(format!("Failed to parse {}: {}", self.config_file.display(), e))
        })
    }

    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(dir) = self.config_file.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| Error::config(format!("Failed to create config directory: {}", e)))?;
        }

        let toml = toml::to_string_pretty(config)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&self.config_file, toml)
            .map_err(|e| Error::config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }
}
