/// Project discovery
///
/// Finds project directories under the configured roots by looking for
/// common markers like .git, package.json, Cargo.toml, etc. Git worktrees are
/// tied back to the checkout that owns them.

use crate::core::project::{path_key, Project};
use crate::error::Result;
use git2::Repository;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Project root detection markers
const PROJECT_MARKERS: &[&str] = &[
    ".git",
    "Cargo.toml",
    "package.json",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "requirements.txt",
    "Gemfile",
    "composer.json",
    ".project",
];

/// Directories never descended into
const SKIP_DIRS: &[&str] = &["node_modules", "target", "vendor", "dist", "build"];

/// Handles project discovery and root detection
pub struct ProjectDetector;

impl ProjectDetector {
    /// Discover projects below `roots`
    ///
    /// # Arguments
    /// * `roots` - Directories to scan, in priority order
    /// * `max_depth` - How many directory levels below each root to look at
    ///
    /// # Returns
    /// * Projects in discovery order, one per path
    pub fn discover(roots: &[PathBuf], max_depth: usize) -> Vec<Project> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();

        for root in roots {
            if !root.is_dir() {
                tracing::debug!("Skipping missing project root {}", root.display());
                continue;
            }
            Self::walk(root, 0, max_depth, None, &mut found, &mut seen);
        }

        tracing::debug!("Discovered {} projects", found.len());
        found
    }

    fn walk(
        dir: &Path,
        depth: usize,
        max_depth: usize,
        ecosystem: Option<&Path>,
        found: &mut Vec<Project>,
        seen: &mut HashSet<String>,
    ) {
        if depth >= max_depth {
            return;
        }

        for child in Self::child_dirs(dir) {
            if !Self::is_project(&child) {
                Self::walk(&child, depth + 1, max_depth, ecosystem, found, seen);
                continue;
            }

            if !seen.insert(path_key(&child)) {
                continue;
            }

            let mut project = Self::describe(&child);
            project.parent_ecosystem_path = ecosystem.map(Path::to_path_buf);
            let is_main_checkout = !project.is_worktree;
            found.push(project);
            let index = found.len() - 1;

            if is_main_checkout {
                for worktree in Self::linked_worktrees(&child) {
                    if seen.insert(path_key(&worktree.path)) {
                        found.push(worktree);
                    }
                }
            }

            // Projects nested inside this one turn it into an ecosystem
            let before = found.len();
            Self::walk(&child, depth + 1, max_depth, Some(child.as_path()), found, seen);
            if found.len() > before {
                found[index].is_ecosystem = true;
            }
        }
    }

    /// Visible subdirectories of `dir`, sorted by name
    fn child_dirs(dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                !name.starts_with('.') && !SKIP_DIRS.contains(&&*name)
            })
            .map(|entry| entry.path())
            .collect();

        dirs.sort();
        dirs
    }

    /// Build the project record for a directory, resolving worktree parents
    pub fn describe(path: &Path) -> Project {
        match Self::worktree_parent(path) {
            Some(parent) => Project::worktree(path, parent),
            None => Project::new(path),
        }
    }

    /// Checkout owning `path` if `path` is a linked git worktree
    fn worktree_parent(path: &Path) -> Option<PathBuf> {
        if !Self::is_git_repo(path) {
            return None;
        }

        let repo = Repository::open(path).ok()?;
        if !repo.is_worktree() {
            return None;
        }

        // A linked worktree's git dir is <common>/worktrees/<name>/
        let common = repo.path().parent()?.parent()?;
        let parent = if common.file_name().map(|n| n == ".git").unwrap_or(false) {
            common.parent()?.to_path_buf()
        } else {
            // Bare repository: the git dir is the project
            common.to_path_buf()
        };
        Some(parent)
    }

    /// Linked worktrees registered on the main checkout at `path`
    fn linked_worktrees(path: &Path) -> Vec<Project> {
        if !Self::is_git_repo(path) {
            return Vec::new();
        }

        let Ok(repo) = Repository::open(path) else {
            return Vec::new();
        };
        let Ok(names) = repo.worktrees() else {
            return Vec::new();
        };

        let mut worktrees: Vec<Project> = names
            .iter()
            .flatten()
            .filter_map(|name| repo.find_worktree(name).ok())
            .filter(|worktree| worktree.validate().is_ok())
            .map(|worktree| Project::worktree(worktree.path(), path))
            .collect();

        worktrees.sort_by(|a, b| a.path.cmp(&b.path));
        worktrees
    }

    /// Detect the project root from a given path
    ///
    /// Walks up the directory tree looking for common project markers and
    /// falls back to the start path when none is found.
    pub fn detect<P: AsRef<Path>>(start_path: P) -> Result<PathBuf> {
        let start_path = start_path.as_ref();

        // Ensure the path is absolute
        let absolute_path = if start_path.is_absolute() {
            start_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(start_path)
        };

        let mut current = absolute_path.as_path();
        loop {
            if Self::is_project(current) {
                return Ok(current.to_path_buf());
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return Ok(absolute_path),
            }
        }
    }

    /// Whether `path` carries any project marker
    pub fn is_project<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        PROJECT_MARKERS
            .iter()
            .any(|marker| path.join(marker).exists())
    }

    /// Detect if path is a git repository
    pub fn is_git_repo<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().join(".git").exists()
    }
}
