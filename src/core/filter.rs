/// Live query filtering
///
/// Narrows the ranked project list while the user types. Matches are grouped
/// into tiers so a literal name hit always beats an incidental path hit.

use crate::core::project::Project;

/// Match tiers, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    ExactName,
    NamePrefix,
    NameContains,
    PathContains,
}

/// Tiered substring filter over projects
pub struct FilterEngine;

impl FilterEngine {
    /// Filter projects against a query
    ///
    /// # Arguments
    /// * `projects` - Ranked projects, in display order
    /// * `query` - Query text; only the empty string matches everything,
    ///   whitespace is matched like any other character
    ///
    /// # Returns
    /// * Matching projects, tier by tier, each tier in input order
    pub fn filter(projects: Vec<Project>, query: &str) -> Vec<Project> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return projects;
        }

        let mut tiers: [Vec<Project>; 4] = Default::default();
        for project in projects {
            if let Some(tier) = Self::classify(&project, &needle) {
                tiers[tier as usize].push(project);
            }
        }

        tiers.into_iter().flatten().collect()
    }

    /// Same as [`FilterEngine::filter`] but yields indices into `projects`
    ///
    /// Used by the controller so the ranked list is never cloned per keystroke.
    pub fn filter_indices(projects: &[Project], query: &str) -> Vec<usize> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return (0..projects.len()).collect();
        }

        let mut tiers: [Vec<usize>; 4] = Default::default();
        for (index, project) in projects.iter().enumerate() {
            if let Some(tier) = Self::classify(project, &needle) {
                tiers[tier as usize].push(index);
            }
        }

        tiers.into_iter().flatten().collect()
    }

    /// Tier a project falls into for an already lowercased, non-empty needle
    pub fn classify(project: &Project, needle: &str) -> Option<MatchTier> {
        let name = project.name.to_lowercase();

        if name == needle {
            Some(MatchTier::ExactName)
        } else if name.starts_with(needle) {
            Some(MatchTier::NamePrefix)
        } else if name.contains(needle) {
            Some(MatchTier::NameContains)
        } else if project
            .path
            .to_string_lossy()
            .to_lowercase()
            .contains(needle)
        {
            Some(MatchTier::PathContains)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_path_only_match_comes_last() {
        let mut path_only = Project::new("/work/foo/x");
        path_only.name = "bar".to_string();

        let input = vec![path_only, Project::new("/work/foobar"), Project::new("/work/foo")];
        let filtered = FilterEngine::filter(input, "foo");
        assert_eq!(names(&filtered), vec!["foo", "foobar", "bar"]);
    }

    #[test]
    fn test_exact_prefix_then_path() {
        let mut barfoo = Project::new("/work/foo/x");
        barfoo.name = "barfoo".to_string();

        let input = vec![barfoo, Project::new("/work/foobar"), Project::new("/work/foo")];
        let filtered = FilterEngine::filter(input, "foo");

        assert_eq!(names(&filtered), vec!["foo", "foobar", "barfoo"]);
    }

    #[test]
    fn test_case_insensitive() {
        let input = vec![Project::new("/work/MyApp"), Project::new("/work/other")];
        let filtered = FilterEngine::filter(input, "myapp");
        assert_eq!(names(&filtered), vec!["MyApp"]);
    }

    #[test]
    fn test_empty_query_is_identity() {
        let input = vec![Project::new("/work/b"), Project::new("/work/a")];
        assert_eq!(FilterEngine::filter(input.clone(), ""), input);
    }

    #[test]
    fn test_whitespace_is_significant() {
        let input = vec![Project::new("/work/my app"), Project::new("/work/app")];
        assert_eq!(names(&FilterEngine::filter(input.clone(), " ")), vec!["my app"]);
        assert!(FilterEngine::filter(input, "app ").is_empty());
    }

    #[test]
    fn test_non_matching_dropped_and_subset() {
        let input = vec![
            Project::new("/work/alpha"),
            Project::new("/work/beta"),
            Project::new("/work/alphabet"),
        ];
        let filtered = FilterEngine::filter(input.clone(), "alp");

        assert_eq!(names(&filtered), vec!["alpha", "alphabet"]);
        assert!(filtered.iter().all(|p| input.contains(p)));
        assert!(filtered
            .iter()
            .all(|p| FilterEngine::classify(p, "alp").is_some()));
    }

    #[test]
    fn test_tier_keeps_input_order() {
        let input = vec![
            Project::new("/work/app-two"),
            Project::new("/work/app-one"),
        ];
        let filtered = FilterEngine::filter(input, "app");
        assert_eq!(names(&filtered), vec!["app-two", "app-one"]);
    }

    #[test]
    fn test_filter_indices_matches_filter() {
        let input = vec![
            Project::new("/work/xfoo"),
            Project::new("/work/foo"),
            Project::new("/work/bar"),
        ];
        let indices = FilterEngine::filter_indices(&input, "foo");
        assert_eq!(indices, vec![1, 0]);
    }
}
