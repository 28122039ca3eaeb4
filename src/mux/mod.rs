/// Session multiplexer integration
///
/// The picker only needs a handful of operations from the multiplexer. They
/// sit behind the `Multiplexer` trait so tests can swap in a fake.

pub mod existence;
#[cfg(test)]
pub(crate) mod fake;
pub mod tmux;

pub use existence::ExistenceCache;
pub use tmux::Tmux;

use crate::error::Result;
use std::path::Path;

/// Operations the picker needs from a session multiplexer
///
/// Calls are synchronous and block until the multiplexer answers.
pub trait Multiplexer: Send + Sync {
    fn session_exists(&self, name: &str) -> Result<bool>;

    fn kill_session(&self, name: &str) -> Result<()>;

    fn switch_to(&self, name: &str) -> Result<()>;

    fn create_session(&self, name: &str, working_dir: &Path) -> Result<()>;

    fn current_session_name(&self) -> Result<String>;

    /// Visible text of the session's active pane
    fn capture(&self, name: &str) -> Result<String>;
}

/// Session name for a project directory
///
/// Base name of the path with characters the multiplexer treats as target
/// separators (`.` and `:`) replaced by `_`.
pub fn session_name_for(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "root".to_string());

    base.chars()
        .map(|c| match c {
            '.' | ':' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_name_for() {
        assert_eq!(session_name_for(Path::new("/code/app")), "app");
        assert_eq!(session_name_for(Path::new("/code/my.site")), "my_site");
        assert_eq!(session_name_for(Path::new("/code/a:b.c")), "a_b_c");
        assert_eq!(session_name_for(Path::new("/")), "root");
    }

    #[test]
    fn test_session_name_is_deterministic() {
        let path = Path::new("/code/.dotfiles");
        assert_eq!(session_name_for(path), session_name_for(path));
        assert_eq!(session_name_for(path), "_dotfiles");
    }
}
