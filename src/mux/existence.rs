/// Session existence cache
///
/// Redrawing the list asks "is there a session for this project?" once per
/// row. Answers are memoized per path for the whole run and only dropped when
/// the controller knows the state changed.

use crate::core::project::path_key;
use crate::mux::{session_name_for, Multiplexer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Per-run memo of path -> session exists
pub struct ExistenceCache {
    mux: Arc<dyn Multiplexer>,
    known: HashMap<String, bool>,
}

impl ExistenceCache {
    pub fn new(mux: Arc<dyn Multiplexer>) -> Self {
        Self {
            mux,
            known: HashMap::new(),
        }
    }

    /// Whether a session exists for the project at `path`
    ///
    /// The first call per path asks the multiplexer; errors count as "no".
    pub fn exists(&mut self, path: &Path) -> bool {
        let key = path_key(path);
        if let Some(known) = self.known.get(&key) {
            return *known;
        }

        let name = session_name_for(path);
        let exists = match self.mux.session_exists(&name) {
            Ok(exists) => exists,
            Err(e) => {
                tracing::debug!("Existence probe for {} failed: {}", name, e);
                false
            }
        };

        self.known.insert(key, exists);
        exists
    }

    /// Record a state we already know, e.g. right after creating a session
    pub fn mark(&mut self, path: &Path, exists: bool) {
        self.known.insert(path_key(path), exists);
    }

    /// Forget the answer for one path
    pub fn invalidate(&mut self, path: &Path) {
        self.known.remove(&path_key(path));
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::fake::FakeMux;

    #[test]
    fn test_memoizes_after_first_probe() {
        let mux = Arc::new(FakeMux::with_sessions(&["app"]));
        let mut cache = ExistenceCache::new(mux.clone());

        assert!(cache.exists(Path::new("/code/app")));
        assert!(cache.exists(Path::new("/code/app")));
        assert_eq!(mux.probe_count(), 1);
    }

    #[test]
    fn test_errors_memoized_as_false() {
        let mux = Arc::new(FakeMux::failing());
        let mut cache = ExistenceCache::new(mux.clone());

        assert!(!cache.exists(Path::new("/code/app")));
        assert!(!cache.exists(Path::new("/code/app")));
        assert_eq!(mux.probe_count(), 1);
    }

    #[test]
    fn test_no_self_expiry_until_invalidated() {
        let mux = Arc::new(FakeMux::default());
        let mut cache = ExistenceCache::new(mux.clone());
        let path = Path::new("/code/app");

        assert!(!cache.exists(path));
        mux.create_session("app", path).unwrap();
        // Still the memoized answer
        assert!(!cache.exists(path));

        cache.invalidate(path);
        assert!(cache.exists(path));
        assert_eq!(mux.probe_count(), 2);
    }

    #[test]
    fn test_mark_skips_probe() {
        let mux = Arc::new(FakeMux::default());
        let mut cache = ExistenceCache::new(mux.clone());

        cache.mark(Path::new("/code/app"), true);
        assert!(cache.exists(Path::new("/code/app")));
        assert_eq!(mux.probe_count(), 0);
        assert_eq!(cache.len(), 1);
    }
}
