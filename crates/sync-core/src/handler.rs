//! Per-kind sync handler
//!
//! A handler binds one serializer registration to the sync root and carries
//! the item-level operations: enumerate candidate files, report, import one
//! item, export. Failures inside an item never escape as errors — they
//! become failed [`SyncAction`]s so a bad file cannot abort a run.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use sync_node::{file_name, read_node, scan, write_text, ChangeKind, PortableNode};
use sync_serializers::{SerializeContext, SerializerRegistration};
use sync_store::{walk, Entity, EntityKind};

use crate::action::SyncAction;
use crate::error::{Error, Result};
use crate::events::{ItemNotice, SyncCallbacks};
use crate::options::HandlerOptions;

/// One parsed portable file waiting to be processed.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub kind: EntityKind,
    pub file: PathBuf,
    pub node: PortableNode,
}

impl Candidate {
    /// Alias recorded in the file, falling back to the file stem.
    pub fn name(&self) -> String {
        self.node
            .attribute("alias")
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
    }

    /// The portable tree path this file would occupy; used to match
    /// declared references against the candidate set.
    pub fn portable_path(&self) -> String {
        let name = self.name();
        match self.node.parent.as_deref() {
            Some(parent) => format!("{}/{}", parent.trim_end_matches('/'), name),
            None => format!("/{name}"),
        }
    }
}

/// The per-kind unit of orchestration.
pub struct SyncHandler<'a> {
    registration: &'a SerializerRegistration,
    root: &'a Path,
}

impl<'a> SyncHandler<'a> {
    pub fn new(registration: &'a SerializerRegistration, root: &'a Path) -> Self {
        Self { registration, root }
    }

    pub fn kind(&self) -> EntityKind {
        self.registration.kind
    }

    /// Folder holding this kind's portable files.
    pub fn folder(&self) -> PathBuf {
        self.root.join(&self.registration.folder)
    }

    /// Read every portable file for this kind. Files that fail to parse,
    /// or whose root name does not match the kind, come back as failed
    /// actions instead of aborting enumeration.
    pub fn load_candidates(&self) -> Result<(Vec<Candidate>, Vec<SyncAction>)> {
        let mut candidates = Vec::new();
        let mut failures = Vec::new();

        for file in scan(&self.folder())? {
            match read_node(&file) {
                Ok(node) if node.name == self.kind().node_root() => {
                    candidates.push(Candidate {
                        kind: self.kind(),
                        file,
                        node,
                    });
                }
                Ok(node) => {
                    failures.push(SyncAction::failed(
                        node.key,
                        file_stem(&file),
                        self.kind(),
                        format!(
                            "expected a {} node, found '{}'",
                            self.kind().node_root(),
                            node.name
                        ),
                    ));
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "unreadable portable file");
                    failures.push(SyncAction::failed(
                        Uuid::nil(),
                        file_stem(&file),
                        self.kind(),
                        e.to_string(),
                    ));
                }
            }
        }

        Ok((candidates, failures))
    }

    /// The live entity's current portable representation, if it exists.
    fn current_node(
        &self,
        ctx: &SerializeContext<'_>,
        key: Uuid,
    ) -> Result<Option<(Entity, PortableNode)>> {
        match ctx.cache.get_by_key(ctx.store, key)? {
            Some(entity) => {
                let node = self.registration.serializer.serialize(&entity, ctx)?;
                Ok(Some((entity, node)))
            }
            None => Ok(None),
        }
    }

    /// Compare one candidate against the live store without writing.
    pub fn report_item(&self, ctx: &SerializeContext<'_>, node: &PortableNode) -> Result<SyncAction> {
        let current = self.current_node(ctx, node.key)?;
        let report = self
            .registration
            .spec
            .compare(current.as_ref().map(|(_, n)| n), node);
        Ok(SyncAction::from_report(
            node.key,
            candidate_name(node),
            self.kind(),
            report,
        ))
    }

    /// Apply one candidate to the live store.
    ///
    /// Unchanged items are skipped unless `force`; the pre-write hook can
    /// veto the single item; tombstones delete. Deferrable serializer
    /// errors (unresolved forward references) propagate so the engine can
    /// queue the item for the second pass.
    pub fn import_item(
        &self,
        ctx: &SerializeContext<'_>,
        node: &PortableNode,
        options: &HandlerOptions,
        callbacks: &SyncCallbacks,
    ) -> Result<SyncAction> {
        let name = candidate_name(node);
        let current = self.current_node(ctx, node.key)?;
        let report = self
            .registration
            .spec
            .compare(current.as_ref().map(|(_, n)| n), node);

        if !report.is_change() && !options.force {
            return Ok(SyncAction::from_report(node.key, name, self.kind(), report));
        }

        let notice = ItemNotice {
            kind: self.kind(),
            key: node.key,
            name: name.clone(),
            change: report.kind,
        };
        if !callbacks.notify_item_saving(&notice) {
            tracing::debug!(name = %name, kind = %self.kind(), "item write vetoed");
            return Ok(SyncAction::skipped(
                node.key,
                name,
                self.kind(),
                "vetoed by observer",
            ));
        }

        if node.is_tombstone() {
            if let Some((entity, _)) = current {
                ctx.store.delete(entity.id)?;
                ctx.cache.evict(entity.id);
            }
            return Ok(SyncAction::from_report(node.key, name, self.kind(), report));
        }

        let entity = self.registration.serializer.deserialize(node, ctx)?;
        let saved = ctx.store.save(entity)?;
        ctx.cache.insert(&saved);
        tracing::debug!(name = %name, kind = %self.kind(), change = %report.kind, "imported");

        Ok(SyncAction::from_report(node.key, name, self.kind(), report))
    }

    /// Serialize live entities to disk, writing only what changed.
    pub fn export(
        &self,
        ctx: &SerializeContext<'_>,
        options: &HandlerOptions,
        callbacks: &SyncCallbacks,
    ) -> Vec<SyncAction> {
        let entities = match walk(ctx.store, self.kind()) {
            Ok(entities) => entities,
            Err(e) => {
                return vec![SyncAction::failed(
                    Uuid::nil(),
                    self.kind().node_root(),
                    self.kind(),
                    e.to_string(),
                )];
            }
        };

        let mut actions = Vec::new();
        for entity in entities {
            if entity.disabled && !options.include_disabled {
                continue;
            }
            match self.export_item(ctx, &entity, options, callbacks) {
                Ok(action) => actions.push(action),
                Err(e) => {
                    actions.push(SyncAction::failed(
                        entity.key,
                        entity.name,
                        self.kind(),
                        e.to_string(),
                    ));
                }
            }
        }
        actions
    }

    fn export_item(
        &self,
        ctx: &SerializeContext<'_>,
        entity: &Entity,
        options: &HandlerOptions,
        callbacks: &SyncCallbacks,
    ) -> Result<SyncAction> {
        let node = self.registration.serializer.serialize(entity, ctx)?;
        let text = node.to_text()?;
        let file = self.folder().join(file_name(&entity.name));

        let existing = match fs::read_to_string(&file) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::io(&file, e)),
        };

        // Checksum fast path: identical bytes need no diff and no write.
        if let Some(existing) = &existing {
            if checksum(existing) == checksum(&text) && !options.force {
                return Ok(SyncAction::from_report(
                    entity.key,
                    entity.name.clone(),
                    self.kind(),
                    sync_node::ChangeReport::no_change(),
                ));
            }
        }

        let current = existing.and_then(|c| PortableNode::from_text(&c).ok());
        let report = self.registration.spec.compare(current.as_ref(), &node);

        if !report.is_change() && !options.force {
            return Ok(SyncAction::from_report(
                entity.key,
                entity.name.clone(),
                self.kind(),
                report,
            ));
        }

        let notice = ItemNotice {
            kind: self.kind(),
            key: entity.key,
            name: entity.name.clone(),
            change: if report.is_change() {
                report.kind
            } else {
                ChangeKind::Update
            },
        };
        if !callbacks.notify_item_saving(&notice) {
            return Ok(SyncAction::skipped(
                entity.key,
                entity.name.clone(),
                self.kind(),
                "vetoed by observer",
            ));
        }

        write_text(&file, &text)?;
        tracing::debug!(file = %file.display(), "exported");
        Ok(SyncAction::from_report(
            entity.key,
            entity.name.clone(),
            self.kind(),
            report,
        ))
    }
}

fn candidate_name(node: &PortableNode) -> String {
    node.attribute("alias")
        .map(str::to_string)
        .unwrap_or_else(|| node.name.clone())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Hex SHA-256 of serialized node text.
pub fn checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
