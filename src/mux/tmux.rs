/// tmux-backed multiplexer
///
/// Shells out to the tmux binary for every operation.

use crate::error::{PickerError, Result};
use crate::mux::Multiplexer;
use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Talks to the tmux server of the current user
pub struct Tmux {
    binary: String,
}

impl Tmux {
    pub fn new<S: Into<String>>(binary: S) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Whether we are running inside a tmux client
    pub fn inside_tmux() -> bool {
        std::env::var_os("TMUX").is_some()
    }

    /// Check if tmux is available on the system
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!("{} {}", self.binary, args.join(" "));
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| PickerError::Multiplexer(format!("Failed to run {}: {}", self.binary, e)))
    }

    /// Run a command that must succeed; stderr becomes the error message
    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(PickerError::Multiplexer(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

impl Default for Tmux {
    fn default() -> Self {
        Self::new("tmux")
    }
}

/// Exact-match target so "app" never resolves to "app-old"
fn exact(name: &str) -> String {
    format!("={}", name)
}

/// Active pane of a session, for commands that take a pane target
fn pane(name: &str) -> String {
    format!("={}:", name)
}

impl Multiplexer for Tmux {
    fn session_exists(&self, name: &str) -> Result<bool> {
        let output = self.run(&["has-session", "-t", &exact(name)])?;
        Ok(output.status.success())
    }

    fn kill_session(&self, name: &str) -> Result<()> {
        self.run_checked(&["kill-session", "-t", &exact(name)])?;
        tracing::info!("Killed tmux session {}", name);
        Ok(())
    }

    fn switch_to(&self, name: &str) -> Result<()> {
        let target = exact(name);
        if Self::inside_tmux() {
            self.run_checked(&["switch-client", "-t", &target])?;
        } else {
            // attach needs the terminal, so don't capture its output
            let status = Command::new(&self.binary)
                .args(["attach-session", "-t", &target])
                .status()
                .map_err(|e| {
                    PickerError::Multiplexer(format!("Failed to run {}: {}", self.binary, e))
                })?;
            if !status.success() {
                return Err(PickerError::Multiplexer(format!(
                    "Failed to attach to session '{}'",
                    name
                )));
            }
        }
        tracing::info!("Switched to tmux session {}", name);
        Ok(())
    }

    fn create_session(&self, name: &str, working_dir: &Path) -> Result<()> {
        let dir = working_dir.to_string_lossy();
        self.run_checked(&["new-session", "-d", "-s", name, "-c", &dir])?;
        tracing::info!("Created tmux session {} in {}", name, dir);
        Ok(())
    }

    fn current_session_name(&self) -> Result<String> {
        let name = self.run_checked(&["display-message", "-p", "#S"])?;
        Ok(name.trim().to_string())
    }

    fn capture(&self, name: &str) -> Result<String> {
        self.run_checked(&["capture-pane", "-p", "-t", &pane(name)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_target() {
        assert_eq!(exact("app"), "=app");
    }

    #[test]
    fn test_pane_target_names_session_window() {
        assert_eq!(pane("app"), "=app:");
        assert_eq!(pane("my_site"), "=my_site:");
    }

    #[test]
    fn test_missing_binary_is_multiplexer_error() {
        let tmux = Tmux::new("definitely-not-a-tmux-binary");
        assert!(!tmux.is_available());

        match tmux.session_exists("app") {
            Err(PickerError::Multiplexer(msg)) => assert!(msg.contains("Failed to run")),
            other => panic!("Expected Multiplexer error, got {:?}", other),
        }
    }
}
