/// In-memory multiplexer for tests

use crate::error::{PickerError, Result};
use crate::mux::Multiplexer;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeMux {
    pub sessions: Mutex<HashSet<String>>,
    pub created: Mutex<Vec<(String, PathBuf)>>,
    pub switched: Mutex<Vec<String>>,
    pub probes: AtomicUsize,
    /// Every call fails with a multiplexer error
    pub fail: bool,
}

impl FakeMux {
    pub fn with_sessions(names: &[&str]) -> Self {
        let fake = Self::default();
        fake.sessions
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| n.to_string()));
        fake
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(PickerError::Multiplexer("no server running".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Multiplexer for FakeMux {
    fn session_exists(&self, name: &str) -> Result<bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.sessions.lock().unwrap().contains(name))
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        self.check()?;
        if self.sessions.lock().unwrap().remove(name) {
            Ok(())
        } else {
            Err(PickerError::Multiplexer(format!("can't find session: {}", name)))
        }
    }

    fn switch_to(&self, name: &str) -> Result<()> {
        self.check()?;
        self.switched.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn create_session(&self, name: &str, working_dir: &Path) -> Result<()> {
        self.check()?;
        self.sessions.lock().unwrap().insert(name.to_string());
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), working_dir.to_path_buf()));
        Ok(())
    }

    fn current_session_name(&self) -> Result<String> {
        self.check()?;
        Ok(self.switched.lock().unwrap().last().cloned().unwrap_or_default())
    }

    fn capture(&self, name: &str) -> Result<String> {
        self.check()?;
        Ok(format!("{}$ ", name))
    }
}
