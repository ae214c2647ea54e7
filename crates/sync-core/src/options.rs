//! Per-run configuration

use serde::{Deserialize, Serialize};

/// Which bulk operation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    /// Compare only; never write to the live store or the disk.
    Report,
    /// Apply portable files to the live store.
    Import,
    /// Write live entities out as portable files.
    Export,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOperation::Report => f.write_str("report"),
            SyncOperation::Import => f.write_str("import"),
            SyncOperation::Export => f.write_str("export"),
        }
    }
}

/// Options for one run, constructed once and passed by value through the
/// orchestration call chain. No ambient state carries these between runs.
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    /// Named handler set in the manifest.
    pub set_name: String,
    /// Target group label, recorded on notifications.
    pub group: String,
    pub operation: SyncOperation,
    /// Bypass the "no material change, skip the write" optimisation.
    pub force: bool,
    /// Export entities flagged as disabled too.
    pub include_disabled: bool,
    /// Acting user identity, recorded on notifications.
    pub user: Option<String>,
}

impl HandlerOptions {
    pub fn new(operation: SyncOperation) -> Self {
        Self {
            set_name: "default".to_string(),
            group: "default".to_string(),
            operation,
            force: false,
            include_disabled: false,
            user: None,
        }
    }

    pub fn with_set(mut self, set_name: impl Into<String>) -> Self {
        self.set_name = set_name.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_disabled(mut self) -> Self {
        self.include_disabled = true;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}
