/// Interaction controller
///
/// Owns the picker state and applies one input at a time. Rendering is left
/// to the caller, which reads `rows()` and `status()` after every input.

use crate::core::{path_key, FilterEngine, Project, RankingEngine};
use crate::enrich::EnrichmentRecord;
use crate::error::{ErrorKind, PickerError, Result};
use crate::mux::{session_name_for, ExistenceCache, Multiplexer};
use crate::store::{AccessStore, KeyBindingTable, KeyMapStore};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One user or background event
#[derive(Debug, Clone)]
pub enum Input {
    Char(char),
    Backspace,
    Up,
    Down,
    /// Open the highlighted project
    Select,
    /// Open whatever is bound to the key
    Jump(char),
    /// Bind the highlighted project to the key
    Bind(char),
    Release(char),
    Rename(char, char),
    /// Kill the highlighted project's session
    Kill,
    /// Fresh project list, e.g. after enrichment finished
    ProjectsUpdated(Vec<Project>),
    Quit,
}

/// What the caller should do after an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// A session was opened; the picker can exit
    Switched(String),
    /// The key map changed; external key bindings should be regenerated
    BindingsChanged,
    Quit,
}

/// Display data for one visible project
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub path: PathBuf,
    pub key: Option<char>,
    pub running: bool,
    pub is_worktree: bool,
    pub selected: bool,
    pub facts: EnrichmentRecord,
}

pub struct InteractionController {
    projects: Vec<Project>,
    visible: Vec<usize>,
    query: String,
    cursor: usize,
    history: AccessStore,
    keys: KeyMapStore,
    table: KeyBindingTable,
    cache: ExistenceCache,
    mux: Arc<dyn Multiplexer>,
    status: Option<String>,
    last_error: Option<ErrorKind>,
}

impl InteractionController {
    /// Build a controller over discovered projects
    ///
    /// Projects are ranked here. An unreadable key map starts the picker with
    /// no bindings instead of failing.
    pub fn new(
        projects: Vec<Project>,
        history: AccessStore,
        keys: KeyMapStore,
        mux: Arc<dyn Multiplexer>,
    ) -> Self {
        let table = keys.load().unwrap_or_else(|e| {
            tracing::warn!("Could not read key map {}: {}", keys.path().display(), e);
            keys.empty_table()
        });

        let projects = RankingEngine::rank(projects, &history);
        let visible = (0..projects.len()).collect();

        Self {
            projects,
            visible,
            query: String::new(),
            cursor: 0,
            history,
            keys,
            table,
            cache: ExistenceCache::new(Arc::clone(&mux)),
            mux,
            status: None,
            last_error: None,
        }
    }

    /// Apply one input
    ///
    /// Failures never escape: they end up in `status()` and the state from
    /// before the input is kept.
    pub fn handle(&mut self, input: Input) -> Outcome {
        self.status = None;
        self.last_error = None;

        let result = match input {
            Input::Char(c) => {
                self.query.push(c);
                self.refilter();
                Ok(Outcome::Continue)
            }
            Input::Backspace => {
                self.query.pop();
                self.refilter();
                Ok(Outcome::Continue)
            }
            Input::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                Ok(Outcome::Continue)
            }
            Input::Down => {
                if self.cursor + 1 < self.visible.len() {
                    self.cursor += 1;
                }
                Ok(Outcome::Continue)
            }
            Input::Select => self.open_selected(),
            Input::Jump(key) => self.jump(key),
            Input::Bind(key) => self.bind(key),
            Input::Release(key) => self.release(key),
            Input::Rename(old, new) => self.rename(old, new),
            Input::Kill => self.kill_selected(),
            Input::ProjectsUpdated(projects) => {
                self.replace_projects(projects);
                Ok(Outcome::Continue)
            }
            Input::Quit => Ok(Outcome::Quit),
        };

        result.unwrap_or_else(|e| {
            tracing::debug!("Action failed: {}", e);
            self.last_error = Some(e.kind());
            self.status = Some(e.user_message());
            Outcome::Continue
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Kind of the error raised by the last input, if any
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn bindings(&self) -> &KeyBindingTable {
        &self.table
    }

    pub fn history(&self) -> &AccessStore {
        &self.history
    }

    pub fn selected(&self) -> Option<&Project> {
        self.visible
            .get(self.cursor)
            .and_then(|index| self.projects.get(*index))
    }

    /// Visible projects in display order
    pub fn rows(&mut self) -> Vec<Row> {
        let mut rows = Vec::with_capacity(self.visible.len());
        for (position, index) in self.visible.iter().enumerate() {
            let project = &self.projects[*index];
            rows.push(Row {
                name: project.name.clone(),
                path: project.path.clone(),
                key: self.table.key_for(&project.path),
                running: self.cache.exists(&project.path),
                is_worktree: project.is_worktree,
                selected: position == self.cursor,
                facts: project.facts.clone(),
            });
        }
        rows
    }

    /// Pane contents of the highlighted project's session, if it runs
    pub fn preview(&mut self) -> Option<String> {
        let path = self.selected()?.path.clone();
        if !self.cache.exists(&path) {
            return None;
        }
        self.mux.capture(&session_name_for(&path)).ok()
    }

    /// Swap in a new project list, keeping the query and the highlighted project
    fn replace_projects(&mut self, projects: Vec<Project>) {
        let selected = self.selected().map(|project| path_key(&project.path));

        self.projects = RankingEngine::rank(projects, &self.history);
        self.refilter();

        if let Some(selected) = selected {
            if let Some(position) = self
                .visible
                .iter()
                .position(|index| path_key(&self.projects[*index].path) == selected)
            {
                self.cursor = position;
            }
        }
    }

    fn refilter(&mut self) {
        self.visible = FilterEngine::filter_indices(&self.projects, &self.query);
        self.cursor = 0;
    }

    fn selected_path(&self) -> Result<PathBuf> {
        self.selected()
            .map(|project| project.path.clone())
            .ok_or_else(|| PickerError::ProjectNotFound(self.query.clone()))
    }

    fn open_selected(&mut self) -> Result<Outcome> {
        let path = self.selected_path()?;
        self.open(&path)
    }

    fn jump(&mut self, key: char) -> Result<Outcome> {
        let path = self
            .table
            .path_for(key)
            .map(Path::to_path_buf)
            .ok_or(PickerError::SessionNotFound(key))?;
        self.open(&path)
    }

    /// Record the access, make sure a session exists, switch to it
    fn open(&mut self, path: &Path) -> Result<Outcome> {
        if let Err(e) = self.history.touch(path, Utc::now()) {
            // History is a ranking hint; failing to save it must not block the switch
            tracing::warn!("Could not save access history: {}", e);
            self.status = Some(e.user_message());
        }

        let name = session_name_for(path);
        if !self.cache.exists(path) {
            self.mux.create_session(&name, path)?;
            self.cache.mark(path, true);
        }

        self.mux.switch_to(&name)?;
        Ok(Outcome::Switched(name))
    }

    fn kill_selected(&mut self) -> Result<Outcome> {
        let path = self.selected_path()?;
        let name = session_name_for(&path);

        if !self.cache.exists(&path) {
            self.status = Some(format!("No session running for {}", name));
            return Ok(Outcome::Continue);
        }

        let result = self.mux.kill_session(&name);
        // Whatever happened, the memoized answer is no longer trustworthy
        self.cache.invalidate(&path);
        result?;

        self.status = Some(format!("Killed session {}", name));
        Ok(Outcome::Continue)
    }

    fn bind(&mut self, key: char) -> Result<Outcome> {
        let path = self.selected_path()?;
        let (table, outcome) = self.keys.assign(&path, key)?;
        self.table = table;

        self.status = Some(match outcome.displaced {
            Some((other, Some(new_key))) => format!(
                "Bound '{}'; {} moved to '{}'",
                key,
                other.display(),
                new_key
            ),
            Some((other, None)) => format!("Bound '{}'; {} is now unbound", key, other.display()),
            None => format!("Bound '{}'", key),
        });
        Ok(Outcome::BindingsChanged)
    }

    fn release(&mut self, key: char) -> Result<Outcome> {
        let (table, _) = self.keys.release(key)?;
        self.table = table;
        self.status = Some(format!("Released '{}'", key));
        Ok(Outcome::BindingsChanged)
    }

    fn rename(&mut self, old: char, new: char) -> Result<Outcome> {
        self.table = self.keys.rename(old, new)?;
        self.status = Some(format!("Moved '{}' to '{}'", old, new));
        Ok(Outcome::BindingsChanged)
    }
}
