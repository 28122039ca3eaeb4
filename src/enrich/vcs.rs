/// Git status lookup for a single checkout

use crate::enrich::models::VcsStatus;
use crate::error::Result;
use git2::{BranchType, Repository, StatusOptions};
use std::path::Path;

/// Read branch, dirty file count and upstream divergence
pub fn read_status(path: &Path) -> Result<VcsStatus> {
    let repo = Repository::open(path)?;

    let head = repo.head().ok();
    let branch = head
        .as_ref()
        .filter(|head| head.is_branch())
        .and_then(|head| head.shorthand().map(|s| s.to_string()));

    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(false)
        .include_ignored(false);
    let dirty_files = repo.statuses(Some(&mut options))?.len();

    let (ahead, behind) = match (&branch, head.as_ref().and_then(|h| h.target())) {
        (Some(name), Some(local)) => upstream_divergence(&repo, name, local).unwrap_or((0, 0)),
        _ => (0, 0),
    };

    Ok(VcsStatus {
        branch,
        dirty_files,
        ahead,
        behind,
    })
}

fn upstream_divergence(repo: &Repository, branch: &str, local: git2::Oid) -> Option<(usize, usize)> {
    let branch = repo.find_branch(branch, BranchType::Local).ok()?;
    let upstream = branch.upstream().ok()?;
    let remote = upstream.get().target()?;
    repo.graph_ahead_behind(local, remote).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_not_a_repo_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(read_status(temp.path()).is_err());
    }

    #[test]
    fn test_untracked_files_are_dirty() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();

        let status = read_status(temp.path()).unwrap();
        assert_eq!(status.dirty_files, 2);
        assert!(!status.is_clean());
        assert_eq!((status.ahead, status.behind), (0, 0));
    }

    #[test]
    fn test_clean_repo() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();

        let status = read_status(temp.path()).unwrap();
        assert!(status.is_clean());
    }
}
