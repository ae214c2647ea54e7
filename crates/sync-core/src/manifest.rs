//! Manifest parsing for sync configuration
//!
//! The manifest names the sync root and the handler sets a run can select.
//! It is parsed once at run start; nothing ambient carries configuration
//! between runs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sync_store::EntityKind;

use crate::error::{Error, Result};

fn default_root() -> PathBuf {
    PathBuf::from("sync")
}

/// A named selection of entity kinds to process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlerSet {
    /// Kind names, folder spellings accepted ("content-types").
    #[serde(default)]
    pub handlers: Vec<String>,
}

/// Sync configuration manifest parsed from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Folder holding the portable files, one subfolder per kind.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Named handler sets; the implicit "default" set covers all kinds.
    #[serde(default)]
    pub sets: HashMap<String, HandlerSet>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            root: default_root(),
            sets: HashMap::new(),
        }
    }
}

impl Manifest {
    /// Parse a manifest from TOML content.
    ///
    /// # Example
    ///
    /// ```
    /// use sync_core::Manifest;
    ///
    /// let manifest = Manifest::parse(r#"
    /// root = "portable"
    ///
    /// [sets.settings]
    /// handlers = ["data-types", "content-types"]
    /// "#).unwrap();
    ///
    /// assert_eq!(manifest.root.to_str(), Some("portable"));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Manifest {
            message: e.to_string(),
        })
    }

    /// Load a manifest file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&content)
    }

    /// Use a different sync root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Resolve a handler-set name into entity kinds, in taxonomy order.
    ///
    /// The name "default" resolves to every kind unless the manifest
    /// defines its own set with that name. Unknown set names and unknown
    /// kind names are configuration errors, fatal before any item work.
    pub fn resolve_set(&self, name: &str) -> Result<Vec<EntityKind>> {
        match self.sets.get(name) {
            Some(set) => {
                let mut kinds = Vec::new();
                for handler in &set.handlers {
                    let kind: EntityKind =
                        handler.parse().map_err(|_| Error::UnknownKind {
                            set: name.to_string(),
                            name: handler.clone(),
                        })?;
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                Ok(kinds)
            }
            None if name == "default" => Ok(EntityKind::all().to_vec()),
            None => Err(Error::UnknownHandlerSet {
                name: name.to_string(),
            }),
        }
    }
}
