use crate::error::{NobgError, Result};
use nobg_common::{OutputBound, DEFAULT_DOWNLOAD_PREFIX};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENDPOINT_ENV: &str = "NOBG_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub concurrency: usize,
    pub max_crop_width: u32,
    pub max_crop_height: u32,
    pub download_prefix: String,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/api/remove".into(),
            concurrency: 2,
            max_crop_width: 4096,
            max_crop_height: 4096,
            download_prefix: DEFAULT_DOWNLOAD_PREFIX.into(),
            timeout_seconds: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| NobgError::Config("Home directory not found".into()))?;
        Ok(home.join(".config").join("nobg").join("config.json"))
    }

    /// Removal endpoint; the environment variable wins over the file
    pub fn endpoint(&self) -> String {
        match std::env::var(ENDPOINT_ENV) {
            Ok(url) if !url.trim().is_empty() => url,
            _ => self.endpoint.clone(),
        }
    }

    /// Group size for batch dispatch, never below 1
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn crop_bound(&self) -> OutputBound {
        OutputBound {
            max_width: self.max_crop_width.max(1),
            max_height: self.max_crop_height.max(1),
        }
    }

    pub fn set_endpoint(&mut self, endpoint: String) -> Result<()> {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(NobgError::Config(format!(
                "Endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }
        self.endpoint = endpoint;
        self.save()
    }

    pub fn set_concurrency(&mut self, concurrency: usize) -> Result<()> {
        if concurrency == 0 {
            return Err(NobgError::Config("Concurrency must be at least 1".into()));
        }
        self.concurrency = concurrency;
        self.save()
    }
}
