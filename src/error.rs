/// Error types for berri-jump
///
/// This module defines all possible errors that can occur in the picker.
/// Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Main error type for berri-jump operations
#[derive(Error, Debug)]
pub enum PickerError {
    /// Key is not part of the configured alphabet
    #[error("Invalid key '{0}'")]
    InvalidKey(char),

    /// Target key is already bound to another path
    #[error("Key '{0}' is already in use")]
    KeyInUse(char),

    /// Key has no binding to release
    #[error("Key '{0}' is not bound")]
    KeyNotBound(char),

    /// No session is bound to the given key
    #[error("No session bound to key '{0}'")]
    SessionNotFound(char),

    /// Path is not one of the discovered projects
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// I/O errors (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session multiplexer refused or failed a command
    #[error("Multiplexer error: {0}")]
    Multiplexer(String),

    /// Git-related errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

/// Result type alias for berri-jump operations
pub type Result<T> = std::result::Result<T, PickerError>;

/// Broad error families, used to decide how a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Io,
    Collaborator,
}

impl PickerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PickerError::InvalidKey(_) | PickerError::KeyInUse(_) => ErrorKind::Validation,
            PickerError::KeyNotBound(_)
            | PickerError::SessionNotFound(_)
            | PickerError::ProjectNotFound(_) => ErrorKind::NotFound,
            PickerError::Io(_) | PickerError::Serialization(_) | PickerError::Config(_) => {
                ErrorKind::Io
            }
            PickerError::Multiplexer(_) | PickerError::Git(_) => ErrorKind::Collaborator,
        }
    }

    /// Convert PickerError to a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PickerError::InvalidKey(key) => {
                format!("'{}' is not one of the available keys", key)
            }
            PickerError::KeyInUse(key) => {
                format!("Key '{}' already belongs to another project", key)
            }
            PickerError::KeyNotBound(key) => format!("Key '{}' is not bound to anything", key),
            PickerError::SessionNotFound(key) => format!("Nothing is bound to key '{}'", key),
            PickerError::ProjectNotFound(path) => format!("Unknown project: {}", path),
            PickerError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            PickerError::Serialization(e) => format!("Data format error: {}", e),
            PickerError::Config(msg) => format!("Configuration issue: {}", msg),
            // Collaborator output is shown verbatim
            PickerError::Multiplexer(msg) => msg.clone(),
            PickerError::Git(e) => format!("Git operation failed. Details: {}", e),
        }
    }
}
