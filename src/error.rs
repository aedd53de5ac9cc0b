//! Error types for the navigator

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for navigator operations
pub type Result<T> = std::result::Result<T, NavigatorError>;

/// Navigator error types
#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The selection has no corresponding entry in the data store
    #[error("Not found: {0}")]
    LookupMiss(String),

    /// A link target could not be resolved or opened
    #[error("Cannot open '{keyword}': {reason}")]
    ResourceUnreachable { keyword: String, reason: String },

    /// The data store could not be loaded at startup
    #[error("Failed to load {}: {reason}", path.display())]
    LoadFailure { path: PathBuf, reason: String },

    #[error("Invalid link table: {0}")]
    InvalidDictionary(String),

    #[error("Invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("{0}")]
    Message(String),
}

impl NavigatorError {
    /// Whether the error must stop the program (startup failures only)
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            NavigatorError::LookupMiss(_)
                | NavigatorError::ResourceUnreachable { .. }
                | NavigatorError::Message(_)
        )
    }
}
