use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Address the answering backend listens on by default.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = app_dir()?.join("config.json");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let dir = app_dir()?;
        fs::create_dir_all(&dir)?;

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(dir.join("config.json"), config_content)?;
        Ok(())
    }
}

/// Directory holding config, saved history and the log file.
pub fn app_dir() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

    Ok(config_dir.join("ragchat"))
}

/// Pick the backend address: CLI flag beats environment beats config file.
pub fn resolve_base_url(cli: Option<String>, env: Option<String>, config: &Config) -> String {
    cli.or(env)
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
