/// Project model shared by discovery, ranking, filtering and enrichment

use crate::enrich::EnrichmentRecord;
use std::path::{Path, PathBuf};

/// A project directory found during discovery
///
/// Identity is the absolute path. Projects are rebuilt on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub is_worktree: bool,
    pub parent_path: Option<PathBuf>,
    pub is_ecosystem: bool,
    pub parent_ecosystem_path: Option<PathBuf>,
    /// Best-effort annotations, never authoritative
    pub facts: EnrichmentRecord,
}

impl Project {
    /// Plain project rooted at `path`, named after its last component
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let name = dir_name(&path);
        Self {
            name,
            path,
            is_worktree: false,
            parent_path: None,
            is_ecosystem: false,
            parent_ecosystem_path: None,
            facts: EnrichmentRecord::default(),
        }
    }

    /// Worktree checkout that belongs to the repository at `parent`
    pub fn worktree<P: Into<PathBuf>, Q: Into<PathBuf>>(path: P, parent: Q) -> Self {
        let mut project = Self::new(path);
        project.is_worktree = true;
        project.parent_path = Some(parent.into());
        project
    }

    /// Path used to group this project with its siblings
    ///
    /// Worktrees group under their parent checkout, everything else under itself.
    pub fn group_path(&self) -> &Path {
        match (&self.parent_path, self.is_worktree) {
            (Some(parent), true) => parent,
            _ => &self.path,
        }
    }
}

/// Last path component as a display name
pub fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Normalized form of a path used for every equality check and map key
///
/// Follows the platform: macOS and Windows file systems are case-insensitive
/// by default, everything else is compared byte for byte.
pub fn path_key(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let trimmed = if raw.len() > 1 {
        raw.trim_end_matches(std::path::MAIN_SEPARATOR)
    } else {
        &raw
    };

    if cfg!(any(target_os = "macos", target_os = "windows")) {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// True when both paths name the same location under [`path_key`] rules
pub fn same_path(a: &Path, b: &Path) -> bool {
    path_key(a) == path_key(b)
}
