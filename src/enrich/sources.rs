/// Where enrichment facts come from

use crate::enrich::models::{NoteCounts, PlanStats, VcsStatus};
use crate::enrich::plans::ChecklistParser;
use crate::enrich::vcs;
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplier of per-project facts
///
/// Methods are blocking; the pipeline runs them off the async executor.
pub trait FactSource: Send + Sync + 'static {
    /// One batched lookup: project name -> note counts
    fn note_counts(&self) -> Result<HashMap<String, NoteCounts>>;

    fn vcs_status(&self, path: &Path) -> Result<VcsStatus>;

    fn plan_stats(&self, path: &Path) -> Result<PlanStats>;
}

/// Facts read from the local disk: git via libgit2, plans and notes as markdown
pub struct LocalFacts {
    notes_dir: Option<PathBuf>,
    parser: ChecklistParser,
}

impl LocalFacts {
    pub fn new(notes_dir: Option<PathBuf>) -> Self {
        Self {
            notes_dir,
            parser: ChecklistParser::new(),
        }
    }
}

impl FactSource for LocalFacts {
    fn note_counts(&self) -> Result<HashMap<String, NoteCounts>> {
        match &self.notes_dir {
            Some(dir) => self.parser.note_counts(dir),
            None => Ok(HashMap::new()),
        }
    }

    fn vcs_status(&self, path: &Path) -> Result<VcsStatus> {
        vcs::read_status(path)
    }

    fn plan_stats(&self, path: &Path) -> Result<PlanStats> {
        self.parser.plan_stats(path)
    }
}
