/// Fact types attached to projects by the enrichment pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Optional per-project annotations
///
/// Recomputed every run. A `None` field means "not fetched or fetch failed".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub vcs: Option<VcsStatus>,
    pub notes: Option<NoteCounts>,
    pub plans: Option<PlanStats>,
}

/// Working tree state of a git checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsStatus {
    pub branch: Option<String>,
    pub dirty_files: usize,
    pub ahead: usize,
    pub behind: usize,
}

impl VcsStatus {
    pub fn is_clean(&self) -> bool {
        self.dirty_files == 0
    }
}

/// Notes kept for a project outside its checkout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCounts {
    pub total: usize,
    /// Notes that still carry an unchecked task
    pub open: usize,
}

/// Checkbox progress across a project's plan files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub files: usize,
    pub total_items: usize,
    pub done_items: usize,
}

impl PlanStats {
    /// Fraction of checked items, 0.0 when there are none
    pub fn progress(&self) -> f64 {
        if self.total_items == 0 {
            0.0
        } else {
            self.done_items as f64 / self.total_items as f64
        }
    }
}

/// Which fact families to fetch, and for which projects
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub global_facts: bool,
    pub vcs_status: bool,
    pub plan_stats: bool,
    /// Restrict per-project work to these paths; `None` means every project
    pub only: Option<HashSet<PathBuf>>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            global_facts: true,
            vcs_status: true,
            plan_stats: true,
            only: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_progress() {
        let stats = PlanStats {
            files: 1,
            total_items: 4,
            done_items: 3,
        };
        assert_eq!(stats.progress(), 0.75);
        assert_eq!(PlanStats::default().progress(), 0.0);
    }
}
