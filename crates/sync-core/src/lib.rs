//! Core orchestration layer for Content Sync Manager
//!
//! Coordinates the portable node, store, and serializer crates into whole
//! runs:
//!
//! - **Dependency graph**: deterministic topological ordering of import
//!   candidates, with cycle detection
//! - **Handlers**: per-kind report/import/export operations with
//!   item-boundary failure recovery
//! - **SyncEngine**: the two-pass orchestrator driven by per-run options
//!   and an injected callback set
//! - **Results**: per-item actions aggregated per run, plus the progress
//!   summary consumed by outer layers
//!
//! # Architecture
//!
//! ```text
//!              CLI / host application
//!                       |
//!                   sync-core
//!                       |
//!         +-------------+-------------+
//!         |             |             |
//!     sync-node   sync-serializers  sync-store
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod handler;
pub mod manifest;
pub mod options;
pub mod progress;

pub use action::{SyncAction, SyncActionResult};
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use events::{ItemNotice, RunNotice, SyncCallbacks};
pub use graph::{CycleError, DependencyGraph, GraphEdge};
pub use handler::{checksum, Candidate, SyncHandler};
pub use manifest::{HandlerSet, Manifest};
pub use options::{HandlerOptions, SyncOperation};
pub use progress::{HandlerProgress, HandlerStatus, SyncProgress};
