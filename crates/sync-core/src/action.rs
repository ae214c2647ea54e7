//! Per-item and per-run outcome records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sync_node::{ChangeKind, ChangeRecord, ChangeReport};
use sync_store::EntityKind;

/// The outcome of processing one entity. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncAction {
    pub key: Uuid,
    pub name: String,
    pub kind: EntityKind,
    pub change: ChangeKind,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ChangeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncAction {
    /// Successful outcome carrying the change report detail.
    pub fn from_report(
        key: Uuid,
        name: impl Into<String>,
        kind: EntityKind,
        report: ChangeReport,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            kind,
            change: report.kind,
            success: true,
            details: report.records,
            message: report.message,
        }
    }

    /// Item skipped without an error (vetoed, or nothing to do).
    pub fn skipped(
        key: Uuid,
        name: impl Into<String>,
        kind: EntityKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            kind,
            change: ChangeKind::NoChange,
            success: true,
            details: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// Item failure; the raw error text is retained for diagnostics.
    pub fn failed(
        key: Uuid,
        name: impl Into<String>,
        kind: EntityKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            kind,
            change: ChangeKind::Fail,
            success: false,
            details: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// Aggregate of every [`SyncAction`] in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncActionResult {
    pub actions: Vec<SyncAction>,
    /// The run was vetoed before any work began.
    pub cancelled: bool,
    pub started: DateTime<Utc>,
    pub completed: DateTime<Utc>,
}

impl SyncActionResult {
    pub fn begin() -> Self {
        let now = Utc::now();
        Self {
            actions: Vec::new(),
            cancelled: false,
            started: now,
            completed: now,
        }
    }

    /// A run vetoed by the starting notification: clean exit, no actions.
    pub fn vetoed() -> Self {
        let mut result = Self::begin();
        result.cancelled = true;
        result
    }

    pub fn push(&mut self, action: SyncAction) {
        self.actions.push(action);
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = SyncAction>) {
        self.actions.extend(actions);
    }

    /// Stamp the completion time.
    pub fn complete(mut self) -> Self {
        self.completed = Utc::now();
        self
    }

    /// Number of items that actually changed.
    pub fn change_count(&self) -> usize {
        self.actions.iter().filter(|a| a.change.is_change()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.actions.iter().any(|a| a.change.is_failure())
    }

    /// No changes, no failures, not cancelled.
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.change_count() == 0
    }
}
