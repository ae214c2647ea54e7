//! Change classification types produced by the tracker

use serde::{Deserialize, Serialize};

/// Classification of a detected change.
///
/// The ordering is significant: aggregation treats anything above
/// [`ChangeKind::NoChange`] as a change and anything at or above
/// [`ChangeKind::Fail`] as a failure, and the overall classification of a
/// report is the maximum over its records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ChangeKind {
    #[default]
    NoChange,
    /// A masked value changed; old/new are not disclosed.
    Hidden,
    Create,
    Update,
    Delete,
    Fail,
}

impl ChangeKind {
    /// True for anything a caller would act on.
    pub fn is_change(self) -> bool {
        self > ChangeKind::NoChange
    }

    pub fn is_failure(self) -> bool {
        self >= ChangeKind::Fail
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChangeKind::NoChange => "no change",
            ChangeKind::Hidden => "hidden",
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
            ChangeKind::Fail => "fail",
        };
        f.write_str(label)
    }
}

/// One detected difference at a tracked path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Tracked path the record refers to, e.g. `/Info/Name`.
    pub path: String,
    /// Display name for the tracked value.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
    pub kind: ChangeKind,
}

impl ChangeRecord {
    pub fn update(
        path: impl Into<String>,
        name: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            old: Some(old.into()),
            new: Some(new.into()),
            kind: ChangeKind::Update,
        }
    }

    pub fn create(path: impl Into<String>, name: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            old: None,
            new: Some(new.into()),
            kind: ChangeKind::Create,
        }
    }

    pub fn delete(path: impl Into<String>, name: impl Into<String>, old: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            old: Some(old.into()),
            new: None,
            kind: ChangeKind::Delete,
        }
    }

    /// A change at a masked path; values are replaced with a placeholder.
    pub fn hidden(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            old: Some("****".to_string()),
            new: Some("****".to_string()),
            kind: ChangeKind::Hidden,
        }
    }
}

/// The full comparison outcome for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<ChangeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChangeReport {
    /// A report with no detected changes.
    pub fn no_change() -> Self {
        Self {
            kind: ChangeKind::NoChange,
            records: Vec::new(),
            message: None,
        }
    }

    /// Whole-entity create: the current side did not exist.
    pub fn create(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: ChangeKind::Create,
            records: vec![ChangeRecord::create("/", name.clone(), name)],
            message: None,
        }
    }

    /// Whole-entity delete: the incoming side is a tombstone.
    pub fn delete(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: ChangeKind::Delete,
            records: vec![ChangeRecord::delete("/", name.clone(), name)],
            message: None,
        }
    }

    /// An item-level failure with the raw error retained for diagnostics.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Fail,
            records: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// Build a report from detected records; the overall kind is the most
    /// significant record kind.
    pub fn from_records(records: Vec<ChangeRecord>) -> Self {
        let kind = records
            .iter()
            .map(|r| r.kind)
            .max()
            .unwrap_or(ChangeKind::NoChange);
        Self {
            kind,
            records,
            message: None,
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind.is_change()
    }
}
