/// Key bindings
///
/// Maps a fixed alphabet of single-character keys to project paths. Each key
/// holds at most one path and each path should hold at most one key; `assign`
/// restores the second rule by swapping instead of dropping bindings.

use crate::core::project::{dir_name, path_key, same_path};
use crate::error::{PickerError, Result};
use crate::store::atomic;
use crate::store::models::{KeyBindingEntry, KeyMapFile, StoredBinding};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default alphabet: home row first, then the rest of the letters
pub const DEFAULT_ALPHABET: &str = "asdfghjklqwertyuiopzxcvbnm";

/// What an `assign` call did besides binding the requested key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignOutcome {
    pub key: char,
    pub path: PathBuf,
    /// Key the path held before this call, if any
    pub previous_key: Option<char>,
    /// Path that used to own `key`, and the key it holds now (if any)
    pub displaced: Option<(PathBuf, Option<char>)>,
}

/// In-memory key -> path mapping over an ordered alphabet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindingTable {
    alphabet: Vec<char>,
    /// Alphabet came from the file itself and is written back with it
    pinned: bool,
    bindings: BTreeMap<char, PathBuf>,
}

impl KeyBindingTable {
    /// Empty table over `alphabet`; duplicate and whitespace characters are dropped
    pub fn new<I: IntoIterator<Item = char>>(alphabet: I) -> Self {
        let mut keys: Vec<char> = Vec::new();
        for key in alphabet {
            if !key.is_whitespace() && !keys.contains(&key) {
                keys.push(key);
            }
        }

        Self {
            alphabet: keys,
            pinned: false,
            bindings: BTreeMap::new(),
        }
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn is_valid_key(&self, key: char) -> bool {
        self.alphabet.contains(&key)
    }

    /// Path bound to `key`
    pub fn path_for(&self, key: char) -> Option<&Path> {
        self.bindings.get(&key).map(PathBuf::as_path)
    }

    /// Key bound to `path`, first in alphabet order if the file held duplicates
    pub fn key_for(&self, path: &Path) -> Option<char> {
        let wanted = path_key(path);
        self.alphabet
            .iter()
            .copied()
            .find(|key| {
                self.bindings
                    .get(key)
                    .map(|bound| path_key(bound) == wanted)
                    .unwrap_or(false)
            })
            .or_else(|| {
                // Keys that fell out of the alphabet can still hold a binding
                self.bindings
                    .iter()
                    .find(|(_, bound)| path_key(bound) == wanted)
                    .map(|(key, _)| *key)
            })
    }

    /// Keys from the alphabet that are not bound, in alphabet order
    pub fn available_keys(&self) -> Vec<char> {
        self.alphabet
            .iter()
            .copied()
            .filter(|key| !self.bindings.contains_key(key))
            .collect()
    }

    /// Bound entries in alphabet order, with derived display fields
    pub fn entries(&self) -> Vec<KeyBindingEntry> {
        let mut ordered: Vec<char> = self
            .alphabet
            .iter()
            .copied()
            .filter(|key| self.bindings.contains_key(key))
            .collect();
        ordered.extend(
            self.bindings
                .keys()
                .copied()
                .filter(|key| !self.alphabet.contains(key)),
        );

        ordered
            .into_iter()
            .filter_map(|key| self.bindings.get(&key).map(|path| entry_for(key, path)))
            .collect()
    }

    /// Bind `path` to `key`
    ///
    /// Every other key `path` held is cleared. If `key` already belongs to
    /// another path, that path takes over the key `path` held before (or
    /// becomes unbound when `path` had none).
    pub fn assign(&mut self, path: &Path, key: char) -> Result<AssignOutcome> {
        if !self.is_valid_key(key) {
            return Err(PickerError::InvalidKey(key));
        }

        let previous_key = self.key_for(path);
        let occupant = self
            .bindings
            .get(&key)
            .filter(|bound| !same_path(bound, path))
            .cloned();

        // Build the complete after-state, then swap it in at once. A file
        // edited by hand can give one path several keys; all of them go.
        let mut next = self.bindings.clone();
        next.retain(|_, bound| !same_path(bound, path));
        next.insert(key, path.to_path_buf());

        let displaced = occupant.map(|other| {
            // An occupant still holding another key keeps that one
            let remaining = next
                .iter()
                .find(|(_, bound)| same_path(bound, &other))
                .map(|(held, _)| *held);

            let new_key = remaining.or_else(|| {
                let new_key = previous_key.filter(|old| *old != key)?;
                next.insert(new_key, other.clone());
                Some(new_key)
            });
            (other, new_key)
        });

        self.bindings = next;

        Ok(AssignOutcome {
            key,
            path: path.to_path_buf(),
            previous_key,
            displaced,
        })
    }

    /// Free `key`, returning the path it held
    pub fn release(&mut self, key: char) -> Result<PathBuf> {
        self.bindings
            .remove(&key)
            .ok_or(PickerError::KeyNotBound(key))
    }

    /// Move the binding on `old` to `new`
    pub fn rename(&mut self, old: char, new: char) -> Result<()> {
        let Some(path) = self.bindings.get(&old).cloned() else {
            return Err(PickerError::SessionNotFound(old));
        };

        if old == new {
            return Ok(());
        }

        if self.bindings.contains_key(&new) {
            return Err(PickerError::KeyInUse(new));
        }

        if !self.is_valid_key(new) {
            return Err(PickerError::InvalidKey(new));
        }

        self.bindings.remove(&old);
        self.bindings.insert(new, path);
        Ok(())
    }

    /// Build a table from the file contents
    ///
    /// The file's own key list wins over `default_alphabet`. Empty paths count
    /// as unbound and the stored repository/description are ignored.
    pub fn from_file(file: KeyMapFile, default_alphabet: &str) -> Self {
        let file_alphabet: String = file
            .keys
            .iter()
            .filter_map(|key| single_char(key))
            .collect();

        let alphabet = if file_alphabet.is_empty() {
            default_alphabet
        } else {
            file_alphabet.as_str()
        };

        let mut table = Self::new(alphabet.chars());
        table.pinned = !file_alphabet.is_empty();
        for (key, stored) in file.sessions {
            let Some(key) = single_char(&key) else {
                tracing::warn!("Ignoring key map entry with invalid key '{}'", key);
                continue;
            };
            if stored.path.is_empty() {
                continue;
            }
            table.bindings.insert(key, PathBuf::from(stored.path));
        }

        table
    }

    /// Snapshot for writing; derived fields are recomputed from the path
    ///
    /// The alphabet is only written when the file carried its own list, so a
    /// changed configured alphabet applies on the next load.
    pub fn to_file(&self) -> KeyMapFile {
        let sessions = self
            .entries()
            .into_iter()
            .map(|entry| {
                (
                    entry.key.to_string(),
                    StoredBinding {
                        path: entry.path.to_string_lossy().to_string(),
                        repository: entry.repository,
                        description: entry.description,
                    },
                )
            })
            .collect();

        KeyMapFile {
            keys: if self.pinned {
                self.alphabet.iter().map(|key| key.to_string()).collect()
            } else {
                Vec::new()
            },
            sessions,
        }
    }
}

fn single_char(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) if !key.is_whitespace() => Some(key),
        _ => None,
    }
}

fn entry_for(key: char, path: &Path) -> KeyBindingEntry {
    KeyBindingEntry {
        key,
        path: path.to_path_buf(),
        repository: dir_name(path),
        description: display_path(path),
    }
}

/// Path with the home directory shortened to `~`
pub fn display_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

/// File-backed key map
///
/// Every mutation re-reads the file, applies the change in memory and
/// atomically rewrites the file. Nothing is committed if the write fails.
pub struct KeyMapStore {
    file: PathBuf,
    default_alphabet: String,
}

impl KeyMapStore {
    pub fn new<P: Into<PathBuf>>(file: P, default_alphabet: &str) -> Self {
        Self {
            file: file.into(),
            default_alphabet: default_alphabet.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Table with no bindings over the configured alphabet
    pub fn empty_table(&self) -> KeyBindingTable {
        KeyBindingTable::new(self.default_alphabet.chars())
    }

    /// Current committed table
    pub fn load(&self) -> Result<KeyBindingTable> {
        let file: KeyMapFile = atomic::read_json(&self.file)?.unwrap_or_default();
        Ok(KeyBindingTable::from_file(file, &self.default_alphabet))
    }

    /// Run one read-mutate-write transaction
    ///
    /// Returns the committed table with the mutation's result. Validation
    /// errors from `mutate` abort before anything is written.
    pub fn update<T, F>(&self, mutate: F) -> Result<(KeyBindingTable, T)>
    where
        F: FnOnce(&mut KeyBindingTable) -> Result<T>,
    {
        let mut table = self.load()?;
        let result = mutate(&mut table)?;

        atomic::write_json(&self.file, &table.to_file())?;
        tracing::info!("Saved key map to {}", self.file.display());

        Ok((table, result))
    }

    pub fn assign(&self, path: &Path, key: char) -> Result<(KeyBindingTable, AssignOutcome)> {
        self.update(|table| table.assign(path, key))
    }

    pub fn release(&self, key: char) -> Result<(KeyBindingTable, PathBuf)> {
        self.update(|table| table.release(key))
    }

    pub fn rename(&self, old: char, new: char) -> Result<KeyBindingTable> {
        self.update(|table| table.rename(old, new))
            .map(|(table, ())| table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(pairs: &[(char, &str)]) -> KeyBindingTable {
        let mut table = KeyBindingTable::new("abc".chars());
        for (key, path) in pairs {
            table.bindings.insert(*key, PathBuf::from(path));
        }
        table
    }

    #[test]
    fn test_assign_swaps_keys() {
        let mut t = table(&[('a', "/p1"), ('b', "/p2")]);

        let outcome = t.assign(Path::new("/p1"), 'b').unwrap();

        assert_eq!(t.path_for('a'), Some(Path::new("/p2")));
        assert_eq!(t.path_for('b'), Some(Path::new("/p1")));
        assert_eq!(outcome.previous_key, Some('a'));
        assert_eq!(outcome.displaced, Some((PathBuf::from("/p2"), Some('a'))));
    }

    #[test]
    fn test_assign_free_key_no_swap() {
        let mut t = table(&[('a', "/p1"), ('b', "/p2")]);

        let outcome = t.assign(Path::new("/p3"), 'c').unwrap();

        assert_eq!(t.path_for('a'), Some(Path::new("/p1")));
        assert_eq!(t.path_for('b'), Some(Path::new("/p2")));
        assert_eq!(t.path_for('c'), Some(Path::new("/p3")));
        assert!(outcome.displaced.is_none());
        assert!(outcome.previous_key.is_none());
    }

    #[test]
    fn test_assign_moves_existing_binding() {
        let mut t = table(&[('a', "/p1")]);
        t.assign(Path::new("/p1"), 'c').unwrap();

        assert_eq!(t.path_for('a'), None);
        assert_eq!(t.key_for(Path::new("/p1")), Some('c'));
    }

    #[test]
    fn test_assign_unbound_path_to_taken_key_frees_occupant() {
        let mut t = table(&[('a', "/p1")]);
        let outcome = t.assign(Path::new("/p9"), 'a').unwrap();

        assert_eq!(t.path_for('a'), Some(Path::new("/p9")));
        assert_eq!(t.key_for(Path::new("/p1")), None);
        assert_eq!(outcome.displaced, Some((PathBuf::from("/p1"), None)));
    }

    #[test]
    fn test_assign_same_key_is_noop() {
        let mut t = table(&[('a', "/p1"), ('b', "/p2")]);
        let before = t.clone();
        t.assign(Path::new("/p1"), 'a').unwrap();
        assert_eq!(t, before);
    }

    #[test]
    fn test_assign_clears_every_key_of_path() {
        let mut t = table(&[('a', "/p1"), ('b', "/p2"), ('c', "/p1")]);

        let outcome = t.assign(Path::new("/p1"), 'b').unwrap();

        let keys_of_p1: Vec<char> = t
            .entries()
            .into_iter()
            .filter(|e| e.path == Path::new("/p1"))
            .map(|e| e.key)
            .collect();
        assert_eq!(keys_of_p1, vec!['b']);
        assert_eq!(t.path_for('a'), Some(Path::new("/p2")));
        assert_eq!(t.path_for('c'), None);
        assert_eq!(outcome.previous_key, Some('a'));
    }

    #[test]
    fn test_assign_occupant_with_second_key_keeps_it() {
        let mut t = table(&[('a', "/p1"), ('b', "/p2"), ('c', "/p2")]);

        let outcome = t.assign(Path::new("/p1"), 'b').unwrap();

        assert_eq!(t.path_for('b'), Some(Path::new("/p1")));
        assert_eq!(t.path_for('c'), Some(Path::new("/p2")));
        assert_eq!(t.path_for('a'), None);
        assert_eq!(outcome.displaced, Some((PathBuf::from("/p2"), Some('c'))));
    }

    #[test]
    fn test_assign_invalid_key() {
        let mut t = table(&[('a', "/p1")]);
        let before = t.clone();

        let result = t.assign(Path::new("/p2"), 'z');
        assert!(matches!(result, Err(PickerError::InvalidKey('z'))));
        assert_eq!(t, before);
    }

    #[test]
    fn test_swap_closure_keeps_every_path() {
        let mut t = table(&[('a', "/p1"), ('b', "/p2"), ('c', "/p3")]);
        t.assign(Path::new("/p3"), 'a').unwrap();

        let mut paths: Vec<_> = t.entries().into_iter().map(|e| e.path).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![PathBuf::from("/p1"), PathBuf::from("/p2"), PathBuf::from("/p3")]
        );
        assert_eq!(t.key_for(Path::new("/p1")), Some('c'));
    }

    #[test]
    fn test_release() {
        let mut t = table(&[('a', "/p1")]);
        assert_eq!(t.release('a').unwrap(), PathBuf::from("/p1"));
        assert_eq!(t.available_keys(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_release_unbound_key() {
        let mut t = table(&[('a', "/p1")]);
        let before = t.clone();

        assert!(matches!(t.release('z'), Err(PickerError::KeyNotBound('z'))));
        assert!(matches!(t.release('b'), Err(PickerError::KeyNotBound('b'))));
        assert_eq!(t, before);
    }

    #[test]
    fn test_rename() {
        let mut t = table(&[('a', "/p1"), ('b', "/p2")]);

        t.rename('a', 'c').unwrap();
        assert_eq!(t.path_for('c'), Some(Path::new("/p1")));
        assert_eq!(t.path_for('a'), None);

        assert!(matches!(t.rename('a', 'c'), Err(PickerError::SessionNotFound('a'))));
        assert!(matches!(t.rename('c', 'b'), Err(PickerError::KeyInUse('b'))));
        assert!(matches!(t.rename('c', 'z'), Err(PickerError::InvalidKey('z'))));
    }

    #[test]
    fn test_available_keys_are_unbound() {
        let t = table(&[('b', "/p2")]);
        let available = t.available_keys();

        assert_eq!(available, vec!['a', 'c']);
        assert!(available.iter().all(|key| t.path_for(*key).is_none()));
    }

    #[test]
    fn test_alphabet_dedup() {
        let t = KeyBindingTable::new("aab c".chars());
        assert_eq!(t.alphabet(), &['a', 'b', 'c']);
    }

    #[test]
    fn test_from_file_ignores_derived_fields_and_empty_paths() {
        let raw = r#"{
            "keys": ["x", "y"],
            "sessions": {
                "x": { "path": "/code/app", "repository": "stale", "description": "stale" },
                "y": { "path": "" }
            }
        }"#;
        let file: KeyMapFile = serde_json::from_str(raw).unwrap();
        let t = KeyBindingTable::from_file(file, "abc");

        assert_eq!(t.alphabet(), &['x', 'y']);
        assert_eq!(t.available_keys(), vec!['y']);
        let entry = &t.entries()[0];
        assert_eq!(entry.repository, "app");
        assert_ne!(entry.description, "stale");
    }

    #[test]
    fn test_store_transaction_persists() {
        let temp = TempDir::new().unwrap();
        let store = KeyMapStore::new(temp.path().join("keys.json"), "abc");

        store.assign(Path::new("/p1"), 'a').unwrap();
        store.assign(Path::new("/p2"), 'b').unwrap();
        let (committed, _) = store.assign(Path::new("/p1"), 'b').unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, committed);
        assert_eq!(reloaded.path_for('a'), Some(Path::new("/p2")));
        assert_eq!(reloaded.path_for('b'), Some(Path::new("/p1")));
    }

    #[test]
    fn test_configured_alphabet_change_applies_after_save() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("keys.json");

        KeyMapStore::new(&file, "abc")
            .assign(Path::new("/p1"), 'a')
            .unwrap();

        let table = KeyMapStore::new(&file, "xyz").load().unwrap();
        assert_eq!(table.alphabet(), &['x', 'y', 'z']);
        // The old binding survives outside the alphabet
        assert_eq!(table.path_for('a'), Some(Path::new("/p1")));
        assert_eq!(table.available_keys(), vec!['x', 'y', 'z']);
    }

    #[test]
    fn test_file_alphabet_is_written_back() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("keys.json");
        std::fs::write(&file, r#"{ "keys": ["q", "w"], "sessions": {} }"#).unwrap();

        let store = KeyMapStore::new(&file, "abc");
        store.assign(Path::new("/p1"), 'q').unwrap();

        let written: KeyMapFile = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(written.keys, vec!["q".to_string(), "w".to_string()]);
        assert_eq!(store.load().unwrap().alphabet(), &['q', 'w']);
    }

    #[test]
    fn test_store_io_error_leaves_state() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should be makes the transaction fail
        let file = temp.path().join("keys.json");
        std::fs::create_dir(&file).unwrap();
        std::fs::write(file.join("keep"), "x").unwrap();

        let store = KeyMapStore::new(&file, "abc");
        let result = store.assign(Path::new("/p1"), 'a');

        assert!(matches!(result, Err(PickerError::Io(_))));
        assert!(file.join("keep").exists());
    }

    #[test]
    fn test_store_validation_error_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("keys.json");
        let store = KeyMapStore::new(&file, "abc");

        assert!(store.release('a').is_err());
        assert!(!file.exists());
    }
}
