//! Error types for sync-core

use std::path::PathBuf;

/// Result type for sync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sync-core operations
///
/// Only configuration errors and unresolved dependency cycles stop a run;
/// everything item-shaped is folded into a failed `SyncAction` instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested handler set is not defined in the manifest.
    #[error("Unknown handler set: {name}")]
    UnknownHandlerSet { name: String },

    /// A handler set names an entity kind the taxonomy does not know.
    #[error("Unknown entity kind in handler set '{set}': {name}")]
    UnknownKind { set: String, name: String },

    /// The configured sync root does not exist.
    #[error("Sync root not found: {path}")]
    MissingRoot { path: PathBuf },

    /// The import candidates contain a reference cycle; no valid order
    /// exists for the named items. This is a modeling problem, not an
    /// item failure.
    #[error("Dependency cycle among: {}", names.join(", "))]
    DependencyCycle { names: Vec<String> },

    #[error("Failed to parse manifest: {message}")]
    Manifest { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Node(#[from] sync_node::Error),

    #[error(transparent)]
    Store(#[from] sync_store::Error),

    #[error(transparent)]
    Serializer(#[from] sync_serializers::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
