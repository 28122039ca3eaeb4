/// Configuration
///
/// Read from `$BERRI_JUMP_CONFIG` or `<config dir>/berri-jump/config.json`.
/// Every field is optional; a missing file means defaults.

use crate::enrich::{PRIMARY_CONCURRENCY, SECONDARY_CONCURRENCY};
use crate::error::{PickerError, Result};
use crate::store::{atomic, DEFAULT_ALPHABET};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "BERRI_JUMP_CONFIG";

const APP_DIR: &str = "berri-jump";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories scanned for projects, in order
    pub roots: Vec<PathBuf>,
    /// Directory levels below each root that are searched
    pub max_depth: usize,
    /// Keys available for bindings, in display order
    pub alphabet: String,
    /// Where the key map and access history live
    pub data_dir: Option<PathBuf>,
    /// One folder of markdown notes per project name
    pub notes_dir: Option<PathBuf>,
    pub primary_concurrency: usize,
    pub secondary_concurrency: usize,
    pub tmux_binary: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from("~/code"),
                PathBuf::from("~/projects"),
                PathBuf::from("~/src"),
            ],
            max_depth: 2,
            alphabet: DEFAULT_ALPHABET.to_string(),
            data_dir: None,
            notes_dir: None,
            primary_concurrency: PRIMARY_CONCURRENCY,
            secondary_concurrency: SECONDARY_CONCURRENCY,
            tmux_binary: "tmux".to_string(),
        }
    }
}

impl Config {
    /// Load from the environment override or the default location
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => match Self::default_path() {
                Some(path) => Self::load_from(&path),
                None => Ok(Self::default().expanded()),
            },
        }
    }

    /// Load from a specific file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = atomic::read_json(path)
            .map_err(|e| PickerError::Config(format!("{}: {}", path.display(), e)))?
            .unwrap_or_default();

        let config = config.expanded();
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if self.alphabet.chars().all(char::is_whitespace) {
            return Err(PickerError::Config("alphabet must not be empty".to_string()));
        }
        if self.max_depth == 0 {
            return Err(PickerError::Config("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Resolve `~` in every configured path
    fn expanded(mut self) -> Self {
        self.roots = self.roots.iter().map(|p| expand_home(p)).collect();
        self.data_dir = self.data_dir.as_deref().map(expand_home);
        self.notes_dir = self.notes_dir.as_deref().map(expand_home);
        self
    }

    /// Directory holding persisted state
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
    }

    pub fn keymap_path(&self) -> PathBuf {
        self.data_dir().join("keys.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir().join("history.json")
    }
}

/// Replace a leading `~` with the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
