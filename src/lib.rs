/// berri-jump library
///
/// Project discovery, ranking and one-key session switching on top of tmux.

pub mod config;
pub mod controller;
pub mod core;
pub mod enrich;
pub mod error;
pub mod mux;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use controller::{Input, InteractionController, Outcome, Row};
pub use error::{PickerError, Result};
