/// Plan and note file scanning
///
/// Plans are markdown checklists kept in a project (`PLAN.md`, `TODO.md`,
/// anything under `.plans/`). Notes live outside the projects, one folder per
/// project name.

use crate::enrich::models::{NoteCounts, PlanStats};
use crate::error::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Plan files looked up at the project root
const PLAN_FILES: &[&str] = &["PLAN.md", "plan.md", "TODO.md", "todo.md"];

/// Directory whose markdown files all count as plans
const PLAN_DIR: &str = ".plans";

/// Parses markdown checklists
pub struct ChecklistParser {
    item: Option<Regex>,
}

// "- [ ] task" / "* [x] task" / "1. [X] task"
const CHECKLIST_ITEM: &str = r"(?m)^\s*(?:[-*+]|\d+[.)])\s+\[([ xX])\]";

impl ChecklistParser {
    pub fn new() -> Self {
        Self {
            item: Regex::new(CHECKLIST_ITEM).ok(),
        }
    }

    /// (total, done) checkbox items in `text`
    pub fn count(&self, text: &str) -> (usize, usize) {
        let Some(item) = &self.item else {
            return (0, 0);
        };

        let mut total = 0;
        let mut done = 0;
        for caps in item.captures_iter(text) {
            total += 1;
            if &caps[1] != " " {
                done += 1;
            }
        }
        (total, done)
    }

    /// Checklist progress for the project at `root`
    pub fn plan_stats(&self, root: &Path) -> Result<PlanStats> {
        let mut stats = PlanStats::default();

        for file in plan_files(root)? {
            let text = fs::read_to_string(&file)?;
            let (total, done) = self.count(&text);
            stats.files += 1;
            stats.total_items += total;
            stats.done_items += done;
        }

        Ok(stats)
    }

    /// Note counts for every project folder under `notes_dir`
    ///
    /// A note is "open" while it still has an unchecked item.
    pub fn note_counts(&self, notes_dir: &Path) -> Result<HashMap<String, NoteCounts>> {
        let mut counts = HashMap::new();
        if !notes_dir.is_dir() {
            return Ok(counts);
        }

        for entry in fs::read_dir(notes_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let mut project = NoteCounts::default();
            for note in markdown_files(&entry.path())? {
                let Ok(text) = fs::read_to_string(&note) else {
                    continue;
                };
                let (total, done) = self.count(&text);
                project.total += 1;
                if total > done {
                    project.open += 1;
                }
            }
            counts.insert(name, project);
        }

        Ok(counts)
    }
}

impl Default for ChecklistParser {
    fn default() -> Self {
        Self::new()
    }
}

fn plan_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = PLAN_FILES
        .iter()
        .map(|name| root.join(name))
        .filter(|path| path.is_file())
        .collect();

    // Case-insensitive file systems report PLAN.md and plan.md as the same file
    files.dedup_by(|a, b| {
        fs::canonicalize(a.as_path())
            .ok()
            .zip(fs::canonicalize(b.as_path()).ok())
            .map(|(a, b)| a == b)
            .unwrap_or(false)
    });

    let plan_dir = root.join(PLAN_DIR);
    if plan_dir.is_dir() {
        files.extend(markdown_files(&plan_dir)?);
    }

    Ok(files)
}

fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|ext| ext == "md").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
