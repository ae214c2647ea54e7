//! Injected run callbacks
//!
//! External collaborators observe a run through an explicit callback set
//! passed into the orchestrator, never through global events. The two
//! cancelable hooks are the only cancellation points: vetoing `run_starting`
//! aborts the whole run before any work, vetoing `item_saving` skips that
//! one item.

use uuid::Uuid;

use sync_node::ChangeKind;
use sync_store::EntityKind;

use crate::action::SyncActionResult;
use crate::options::{HandlerOptions, SyncOperation};
use crate::progress::SyncProgress;

/// Details of a bulk run about to start (or just completed).
#[derive(Debug, Clone)]
pub struct RunNotice {
    pub operation: SyncOperation,
    pub set_name: String,
    pub group: String,
    pub user: Option<String>,
}

impl RunNotice {
    pub fn from_options(options: &HandlerOptions) -> Self {
        Self {
            operation: options.operation,
            set_name: options.set_name.clone(),
            group: options.group.clone(),
            user: options.user.clone(),
        }
    }
}

/// Details of a single item about to be written.
#[derive(Debug, Clone)]
pub struct ItemNotice {
    pub kind: EntityKind,
    pub key: Uuid,
    pub name: String,
    pub change: ChangeKind,
}

/// The callback set for one run. All hooks are optional; a missing hook
/// behaves as "proceed".
#[derive(Default)]
pub struct SyncCallbacks {
    run_starting: Option<Box<dyn Fn(&RunNotice) -> bool>>,
    run_completed: Option<Box<dyn Fn(&SyncActionResult)>>,
    item_saving: Option<Box<dyn Fn(&ItemNotice) -> bool>>,
    progress: Option<Box<dyn Fn(&SyncProgress)>>,
}

impl SyncCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe (and optionally veto) the whole run; return `false` to
    /// cancel before any work begins.
    pub fn on_run_starting(mut self, hook: impl Fn(&RunNotice) -> bool + 'static) -> Self {
        self.run_starting = Some(Box::new(hook));
        self
    }

    pub fn on_run_completed(mut self, hook: impl Fn(&SyncActionResult) + 'static) -> Self {
        self.run_completed = Some(Box::new(hook));
        self
    }

    /// Observe (and optionally veto) one item write; return `false` to
    /// skip that item and continue with the next.
    pub fn on_item_saving(mut self, hook: impl Fn(&ItemNotice) -> bool + 'static) -> Self {
        self.item_saving = Some(Box::new(hook));
        self
    }

    pub fn on_progress(mut self, hook: impl Fn(&SyncProgress) + 'static) -> Self {
        self.progress = Some(Box::new(hook));
        self
    }

    pub(crate) fn notify_run_starting(&self, notice: &RunNotice) -> bool {
        self.run_starting.as_ref().map(|h| h(notice)).unwrap_or(true)
    }

    pub(crate) fn notify_run_completed(&self, result: &SyncActionResult) {
        if let Some(hook) = &self.run_completed {
            hook(result);
        }
    }

    pub(crate) fn notify_item_saving(&self, notice: &ItemNotice) -> bool {
        self.item_saving.as_ref().map(|h| h(notice)).unwrap_or(true)
    }

    pub(crate) fn notify_progress(&self, progress: &SyncProgress) {
        if let Some(hook) = &self.progress {
            hook(progress);
        }
    }
}
