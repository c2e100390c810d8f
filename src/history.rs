use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::config;
use crate::conversation::Turn;

/// Advisory on-disk copy of the conversation.
///
/// Memory is the source of truth; save failures are for the caller to log,
/// never to surface.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn open() -> Result<Self> {
        Ok(Self {
            path: config::app_dir()?.join("history.json"),
        })
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, turns: &[Turn]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(turns)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Load previously saved turns. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<Turn>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let turns: Vec<Turn> = serde_json::from_str(&content)?;
        Ok(turns)
    }
}
