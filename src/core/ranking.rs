/// Project ranking
///
/// Orders discovered projects so recently used ones come first while keeping
/// worktrees next to the checkout they belong to.

use crate::core::project::{path_key, Project};
use crate::store::AccessStore;
use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

/// Ranks projects by group recency
pub struct RankingEngine;

impl RankingEngine {
    /// Order projects using the access history
    ///
    /// Accessed groups come before untouched ones, most recent first. Inside an
    /// accessed group the parent checkout leads and worktrees follow by name.
    /// Everything else keeps discovery order, so ranking twice changes nothing.
    pub fn rank(projects: Vec<Project>, history: &AccessStore) -> Vec<Project> {
        // First discovery position of every group keeps equal-time groups together
        let mut group_first: HashMap<String, usize> = HashMap::new();
        for (index, project) in projects.iter().enumerate() {
            group_first
                .entry(path_key(project.group_path()))
                .or_insert(index);
        }

        let mut keyed: Vec<(RankKey, Project)> = projects
            .into_iter()
            .enumerate()
            .map(|(index, project)| {
                let group = path_key(project.group_path());
                let key = RankKey {
                    group_time: history.last_accessed(project.group_path()),
                    group_first: group_first.get(&group).copied().unwrap_or(index),
                    is_worktree: project.is_worktree,
                    name: project.name.clone(),
                };
                (key, project)
            })
            .collect();

        // sort_by is stable; remaining ties keep discovery order
        keyed.sort_by(|(a, _), (b, _)| a.compare(b));

        keyed.into_iter().map(|(_, project)| project).collect()
    }
}

struct RankKey {
    group_time: Option<DateTime<Utc>>,
    group_first: usize,
    is_worktree: bool,
    name: String,
}

impl RankKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self.group_time, other.group_time) {
            (Some(a), Some(b)) => Reverse(a)
                .cmp(&Reverse(b))
                .then(self.group_first.cmp(&other.group_first))
                .then(self.is_worktree.cmp(&other.is_worktree))
                .then_with(|| {
                    if self.is_worktree && other.is_worktree {
                        self.name.cmp(&other.name)
                    } else {
                        Ordering::Equal
                    }
                }),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn names(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_recent_group_first() {
        let mut history = AccessStore::in_memory();
        history.record_access(Path::new("/code/repo-a"), at(100));
        history.record_access(Path::new("/code/repo-b"), at(50));

        let ranked = RankingEngine::rank(
            vec![Project::new("/code/repo-b"), Project::new("/code/repo-a")],
            &history,
        );
        assert_eq!(names(&ranked), vec!["repo-a", "repo-b"]);
    }

    #[test]
    fn test_accessed_before_unaccessed() {
        let mut history = AccessStore::in_memory();
        history.record_access(Path::new("/code/late"), at(10));

        let ranked = RankingEngine::rank(
            vec![
                Project::new("/code/first"),
                Project::new("/code/second"),
                Project::new("/code/late"),
            ],
            &history,
        );
        assert_eq!(names(&ranked), vec!["late", "first", "second"]);
    }

    #[test]
    fn test_worktrees_follow_parent() {
        let mut history = AccessStore::in_memory();
        history.record_access(Path::new("/code/app"), at(200));
        history.record_access(Path::new("/code/other"), at(100));

        let ranked = RankingEngine::rank(
            vec![
                Project::new("/code/other"),
                Project::worktree("/code/wt/zeta", "/code/app"),
                Project::worktree("/code/wt/alpha", "/code/app"),
                Project::new("/code/app"),
            ],
            &history,
        );
        assert_eq!(names(&ranked), vec!["app", "alpha", "zeta", "other"]);
    }

    #[test]
    fn test_stale_worktree_rides_with_active_parent() {
        let mut history = AccessStore::in_memory();
        history.record_access(Path::new("/code/app"), at(300));
        history.record_access(Path::new("/code/lib"), at(200));
        // The worktree itself is old but its parent is the freshest group
        history.record_access(Path::new("/code/wt/old"), at(1));

        let ranked = RankingEngine::rank(
            vec![
                Project::new("/code/lib"),
                Project::worktree("/code/wt/old", "/code/app"),
                Project::new("/code/app"),
            ],
            &history,
        );
        assert_eq!(names(&ranked), vec!["app", "old", "lib"]);
    }

    #[test]
    fn test_unaccessed_same_group_keeps_input_order() {
        let history = AccessStore::in_memory();
        let input = vec![
            Project::worktree("/code/wt/zeta", "/code/app"),
            Project::worktree("/code/wt/alpha", "/code/app"),
        ];

        let ranked = RankingEngine::rank(input, &history);
        assert_eq!(names(&ranked), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let mut history = AccessStore::in_memory();
        history.record_access(Path::new("/code/b"), at(5));
        history.record_access(Path::new("/code/d"), at(5));
        history.record_access(Path::new("/code/c"), at(9));

        let input = vec![
            Project::new("/code/a"),
            Project::new("/code/b"),
            Project::worktree("/code/b-wt", "/code/b"),
            Project::new("/code/c"),
            Project::new("/code/d"),
            Project::new("/code/e"),
        ];

        let once = RankingEngine::rank(input, &history);
        let twice = RankingEngine::rank(once.clone(), &history);
        assert_eq!(once, twice);
        assert_eq!(names(&once), vec!["c", "b", "b-wt", "d", "a", "e"]);
    }
}
