use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub autosave_quiet_ms: u64,
    pub welcome_title: String,
    pub new_note_body: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    pub hover_expand_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub backup_path: String,
    pub timeout_secs: u64,
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub tree: TreeConfig,
    pub sync: SyncConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_quiet_ms: 500,
            welcome_title: "Welcome".to_string(),
            new_note_body: crate::resolver::DEFAULT_LINKED_BODY.to_string(),
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { hover_expand_ms: 500 }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backup_path: "notes-backup.json".to_string(),
            timeout_secs: 30,
            api_base: "https://api.github.com".to_string(),
            branch: None,
        }
    }
}

impl EditorConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }
}

impl TreeConfig {
    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_expand_ms)
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        // A zero timeout would mean "wait forever" to most HTTP clients.
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Directory holding the database and config file, e.g. `~/.local/share/marknest`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marknest")
}

/// Load the config at `path`, writing the defaults there first if it is missing.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        let toml = toml::to_string(&config).map_err(|e| Error::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml)?;
        log::info!("wrote default config to {}", path.display());
        return Ok(config);
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}
