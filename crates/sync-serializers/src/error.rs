//! Error types for sync-serializers

use sync_store::EntityKind;

/// Result type for sync-serializers operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting entities to and from portable
/// nodes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A portable reference points at an entity that does not exist yet.
    ///
    /// The orchestrator treats this as "defer to the second import pass"
    /// rather than an immediate failure.
    #[error("Unresolved {kind} reference: {path}")]
    UnresolvedReference { kind: EntityKind, path: String },

    /// A live entity refers to an id the store no longer knows.
    #[error("Dangling {kind} reference: id {id}")]
    DanglingReference { kind: EntityKind, id: i64 },

    #[error("Missing '{field}' in {root} node")]
    MissingField { root: String, field: String },

    #[error("No serializer registered for root '{0}'")]
    UnknownRoot(String),

    #[error(transparent)]
    Node(#[from] sync_node::Error),

    #[error(transparent)]
    Store(#[from] sync_store::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unresolved(kind: EntityKind, path: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind,
            path: path.into(),
        }
    }

    pub fn missing_field(root: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            root: root.into(),
            field: field.into(),
        }
    }

    /// True when the failure can be retried after other imports complete.
    pub fn is_deferrable(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }
}
