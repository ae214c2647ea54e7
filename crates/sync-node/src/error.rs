//! Error types for sync-node

use std::path::PathBuf;

/// Result type for sync-node operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sync-node operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse portable node: {message}")]
    Parse { message: String },

    #[error("Node root is '{found}', expected '{expected}'")]
    WrongRoot { expected: String, found: String },

    #[error("Missing element '{path}' in node '{node}'")]
    MissingElement { node: String, path: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
