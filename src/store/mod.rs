/// Persistent state
///
/// The access history and the key map, both stored as whole-file JSON.

pub mod access;
pub mod atomic;
pub mod keymap;
pub mod models;

pub use access::AccessStore;
pub use keymap::{AssignOutcome, KeyBindingTable, KeyMapStore, DEFAULT_ALPHABET};
pub use models::*;
