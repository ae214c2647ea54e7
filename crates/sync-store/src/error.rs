//! Error types for sync-store

use std::path::PathBuf;
use uuid::Uuid;

/// Result type for sync-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sync-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Entity not found: id {0}")]
    NotFound(i64),

    #[error("Entity not found: key {0}")]
    KeyNotFound(Uuid),

    #[error("Duplicate entity key {key} (ids {existing} and {incoming})")]
    DuplicateKey {
        key: Uuid,
        existing: i64,
        incoming: i64,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
