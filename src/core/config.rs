//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::identity::Owner;
use crate::core::workspace::Workspace;

/// Outreach configuration with layered hierarchy
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Owner recorded on imported contacts
    pub owner: Option<String>,

    /// Database file, relative to `.outreach/` unless absolute
    pub database: Option<PathBuf>,

    /// Drop rows whose email already exists when importing
    pub skip_duplicates: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load_for(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/outreach/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read(&global_path) {
                config.merge(global);
            }
        }

        // 2. Workspace config (.outreach/config.yaml)
        if let Some(ws) = workspace {
            if let Some(local) = Self::read(&ws.config_path()) {
                config.merge(local);
            }
        }

        // 3. Environment variables
        if let Ok(owner) = std::env::var("OUTREACH_OWNER") {
            if !owner.trim().is_empty() {
                config.owner = Some(owner);
            }
        }
        if let Ok(db) = std::env::var("OUTREACH_DB") {
            if !db.trim().is_empty() {
                config.database = Some(PathBuf::from(db));
            }
        }

        config
    }

    fn read(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        let blank = contents
            .lines()
            .map(str::trim)
            .all(|l| l.is_empty() || l.starts_with('#'));
        if blank {
            return None;
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "outreach")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.owner.is_some() {
            self.owner = other.owner;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.skip_duplicates.is_some() {
            self.skip_duplicates = other.skip_duplicates;
        }
    }

    /// Get the owner, falling back to git config or username
    pub fn owner(&self) -> Owner {
        if let Some(ref owner) = self.owner {
            return Owner::new(owner.clone());
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return Owner::new(name);
                }
            }
        }

        Owner::new(
            std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_else(|_| "unknown".to_string()),
        )
    }

    pub fn skip_duplicates(&self) -> bool {
        self.skip_duplicates.unwrap_or(false)
    }
}
