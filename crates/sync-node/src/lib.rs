//! Portable node model, storage, and change tracking for Content Sync Manager
//!
//! Provides the serialization-format-agnostic tree representation of one
//! entity, lossless text round-tripping, portable file storage, and the
//! declarative change tracker used to diff two representations.

pub mod change;
pub mod error;
pub mod files;
pub mod node;
pub mod tracker;

pub use change::{ChangeKind, ChangeRecord, ChangeReport};
pub use error::{Error, Result};
pub use files::{file_name, read_node, scan, write_node, write_text, NODE_EXTENSION};
pub use node::{NodeAttribute, NodeElement, PortableNode};
pub use tracker::{RepeatingSpec, TrackedItemSpec, TrackedPath};
