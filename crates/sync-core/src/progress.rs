//! Run progress summary
//!
//! The only surface the excluded UI/transport layer consumes: a current
//! step message, per-handler status, and the cumulative change count,
//! pushed through the progress callback as the orchestrator advances.

use serde::{Deserialize, Serialize};
use sync_store::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerStatus {
    Pending,
    Processing,
    Complete,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerProgress {
    pub kind: EntityKind,
    pub status: HandlerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    /// Current step, e.g. "importing content-types".
    pub message: String,
    pub handlers: Vec<HandlerProgress>,
    pub change_count: usize,
}

impl SyncProgress {
    pub fn new(kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        Self {
            message: String::new(),
            handlers: kinds
                .into_iter()
                .map(|kind| HandlerProgress {
                    kind,
                    status: HandlerStatus::Pending,
                })
                .collect(),
            change_count: 0,
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn set_status(&mut self, kind: EntityKind, status: HandlerStatus) {
        if let Some(handler) = self.handlers.iter_mut().find(|h| h.kind == kind) {
            handler.status = status;
        }
    }

    pub fn status_of(&self, kind: EntityKind) -> Option<HandlerStatus> {
        self.handlers
            .iter()
            .find(|h| h.kind == kind)
            .map(|h| h.status)
    }
}
