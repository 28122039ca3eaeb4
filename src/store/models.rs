/// On-disk shapes for the access history and the key map
///
/// Both files are JSON, read whole at startup and rewritten whole after
/// every change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One entry of the access history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub last_accessed: DateTime<Utc>,
    pub access_count: u32,
}

/// Access history file: absolute path -> record
pub type AccessFile = BTreeMap<String, AccessRecord>;

/// A bound key as seen by readers of the key map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindingEntry {
    pub key: char,
    pub path: PathBuf,
    /// Derived from `path`, never read back from disk
    pub repository: String,
    /// Derived from `path`, never read back from disk
    pub description: String,
}

/// Key map file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyMapFile {
    /// Ordered alphabet; empty means "use the configured one"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default)]
    pub sessions: BTreeMap<String, StoredBinding>,
}

/// Key map entry as written to disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredBinding {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}
