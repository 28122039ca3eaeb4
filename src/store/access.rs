/// Access history
///
/// Remembers when each project was last opened and how often. Records are
/// created on first access, bumped afterwards, and never removed.

use crate::core::project::path_key;
use crate::error::Result;
use crate::store::atomic;
use crate::store::models::{AccessFile, AccessRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Persisted map of project path -> access record
#[derive(Debug, Clone, Default)]
pub struct AccessStore {
    /// `None` for stores that never touch disk
    file: Option<PathBuf>,
    /// Keyed by `path_key`, value keeps the path as first written
    records: HashMap<String, (String, AccessRecord)>,
}

impl AccessStore {
    /// Load the history from `file`, starting empty if it does not exist yet
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref().to_path_buf();
        let stored: AccessFile = atomic::read_json(&file)?.unwrap_or_default();

        let records = stored
            .into_iter()
            .map(|(path, record)| (path_key(Path::new(&path)), (path, record)))
            .collect();

        Ok(Self {
            file: Some(file),
            records,
        })
    }

    /// History that lives only in memory
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// When the project at `path` was last opened
    pub fn last_accessed(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.get(path).map(|record| record.last_accessed)
    }

    pub fn get(&self, path: &Path) -> Option<&AccessRecord> {
        self.records.get(&path_key(path)).map(|(_, record)| record)
    }

    /// Number of projects with history
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bump the record for `path` in memory
    pub fn record_access(&mut self, path: &Path, at: DateTime<Utc>) -> &AccessRecord {
        let entry = self
            .records
            .entry(path_key(path))
            .or_insert_with(|| {
                (
                    path.to_string_lossy().to_string(),
                    AccessRecord {
                        last_accessed: at,
                        access_count: 0,
                    },
                )
            });

        entry.1.last_accessed = at;
        entry.1.access_count = entry.1.access_count.saturating_add(1);
        &entry.1
    }

    /// Record an access and rewrite the history file
    ///
    /// On a failed write the in-memory bump is rolled back.
    pub fn touch(&mut self, path: &Path, at: DateTime<Utc>) -> Result<()> {
        let key = path_key(path);
        let previous = self.records.get(&key).cloned();

        self.record_access(path, at);

        if let Err(e) = self.save() {
            match previous {
                Some(previous) => {
                    self.records.insert(key, previous);
                }
                None => {
                    self.records.remove(&key);
                }
            }
            return Err(e);
        }

        Ok(())
    }

    /// Rewrite the whole history file
    pub fn save(&self) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let snapshot: AccessFile = self
            .records
            .values()
            .map(|(path, record)| (path.clone(), record.clone()))
            .collect();

        atomic::write_json(file, &snapshot)?;
        tracing::debug!("Wrote {} access records to {}", snapshot.len(), file.display());
        Ok(())
    }
}
