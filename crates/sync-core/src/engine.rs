//! The sync orchestrator
//!
//! Drives one bulk operation (report, import, or export) across every
//! handler in the selected set, aggregating per-item outcomes into a
//! [`SyncActionResult`]. Imports are globally ordered by the dependency
//! graph and deferred forward references get exactly one second pass.

use sync_serializers::{SerializeContext, SerializerRegistration, SerializerRegistry};
use sync_store::{EntityCache, EntityStore};

use crate::action::{SyncAction, SyncActionResult};
use crate::error::{Error, Result};
use crate::events::{RunNotice, SyncCallbacks};
use crate::graph::DependencyGraph;
use crate::handler::{Candidate, SyncHandler};
use crate::manifest::Manifest;
use crate::options::{HandlerOptions, SyncOperation};
use crate::progress::{HandlerStatus, SyncProgress};

/// Engine for synchronizing entities between the live store and the
/// portable file tree.
///
/// One engine can serve many runs; the resolution cache is cleared at the
/// start and end of every run so nothing leaks between them.
pub struct SyncEngine<'a> {
    store: &'a dyn EntityStore,
    registry: &'a SerializerRegistry,
    manifest: Manifest,
    cache: EntityCache,
}

impl<'a> SyncEngine<'a> {
    pub fn new(store: &'a dyn EntityStore, registry: &'a SerializerRegistry, manifest: Manifest) -> Self {
        Self {
            store,
            registry,
            manifest,
            cache: EntityCache::new(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Execute one bulk run.
    ///
    /// Configuration problems (unknown handler set, missing sync root) and
    /// dependency cycles fail the run before or during setup; every other
    /// failure is item-scoped and lands in the result as a failed action.
    pub fn run(&self, options: HandlerOptions, callbacks: &SyncCallbacks) -> Result<SyncActionResult> {
        let kinds = self.manifest.resolve_set(&options.set_name)?;
        let registrations: Vec<&SerializerRegistration> = self
            .registry
            .iter()
            .filter(|r| kinds.contains(&r.kind))
            .collect();
        for kind in &kinds {
            if self.registry.get(*kind).is_none() {
                tracing::warn!(kind = %kind, "no serializer registered; kind skipped");
            }
        }

        if matches!(options.operation, SyncOperation::Report | SyncOperation::Import)
            && !self.manifest.root.exists()
        {
            return Err(Error::MissingRoot {
                path: self.manifest.root.clone(),
            });
        }

        self.cache.clear();

        let notice = RunNotice::from_options(&options);
        if !callbacks.notify_run_starting(&notice) {
            tracing::info!(operation = %options.operation, "run vetoed before start");
            return Ok(SyncActionResult::vetoed());
        }

        let mut progress = SyncProgress::new(registrations.iter().map(|r| r.kind));
        let mut result = SyncActionResult::begin();

        match options.operation {
            SyncOperation::Report => {
                self.run_report(&registrations, callbacks, &mut progress, &mut result)?;
            }
            SyncOperation::Import => {
                self.run_import(&registrations, &options, callbacks, &mut progress, &mut result)?;
            }
            SyncOperation::Export => {
                self.run_export(&registrations, &options, callbacks, &mut progress, &mut result);
            }
        }

        // Clearing again at run end is part of the cache contract: a
        // long-lived engine must not carry entities into an unrelated run.
        self.cache.clear();

        let result = result.complete();
        callbacks.notify_run_completed(&result);
        Ok(result)
    }

    fn context(&self) -> SerializeContext<'_> {
        SerializeContext::new(self.store, &self.cache)
    }

    fn run_report(
        &self,
        registrations: &[&SerializerRegistration],
        callbacks: &SyncCallbacks,
        progress: &mut SyncProgress,
        result: &mut SyncActionResult,
    ) -> Result<()> {
        let ctx = self.context();
        for registration in registrations {
            let handler = SyncHandler::new(registration, &self.manifest.root);
            progress.set_status(registration.kind, HandlerStatus::Processing);
            progress.set_message(format!("reporting {}", registration.folder));
            callbacks.notify_progress(progress);

            let (candidates, failures) = handler.load_candidates()?;
            result.extend(failures);

            for candidate in candidates {
                let action = handler
                    .report_item(&ctx, &candidate.node)
                    .unwrap_or_else(|e| {
                        SyncAction::failed(
                            candidate.node.key,
                            candidate.name(),
                            registration.kind,
                            e.to_string(),
                        )
                    });
                result.push(action);
            }

            finish_kind(progress, registration, result, callbacks);
        }
        Ok(())
    }

    fn run_import(
        &self,
        registrations: &[&SerializerRegistration],
        options: &HandlerOptions,
        callbacks: &SyncCallbacks,
        progress: &mut SyncProgress,
        result: &mut SyncActionResult,
    ) -> Result<()> {
        let ctx = self.context();

        // Load the full candidate set before anything imports, so the
        // dependency order spans all handlers.
        let mut candidates: Vec<Candidate> = Vec::new();
        for registration in registrations {
            let handler = SyncHandler::new(registration, &self.manifest.root);
            let (found, failures) = handler.load_candidates()?;
            candidates.extend(found);
            result.extend(failures);
        }

        let order = self.sort_candidates(&candidates)?;

        let mut deferred = Vec::new();
        let mut current_kind = None;
        for index in order {
            let candidate = &candidates[index];
            let Some(registration) = self.registry.get(candidate.kind) else {
                continue;
            };
            let handler = SyncHandler::new(registration, &self.manifest.root);

            if current_kind != Some(candidate.kind) {
                current_kind = Some(candidate.kind);
                progress.set_status(candidate.kind, HandlerStatus::Processing);
                progress.set_message(format!("importing {}", registration.folder));
                callbacks.notify_progress(progress);
            }

            match handler.import_item(&ctx, &candidate.node, options, callbacks) {
                Ok(action) => result.push(action),
                Err(Error::Serializer(e)) if e.is_deferrable() => {
                    tracing::debug!(
                        name = %candidate.name(),
                        error = %e,
                        "forward reference; deferring to second pass"
                    );
                    deferred.push(index);
                }
                Err(e) => result.push(SyncAction::failed(
                    candidate.node.key,
                    candidate.name(),
                    candidate.kind,
                    e.to_string(),
                )),
            }
            progress.change_count = result.change_count();
        }

        // Second pass: deferred items only, no further deferral.
        for index in deferred {
            let candidate = &candidates[index];
            let Some(registration) = self.registry.get(candidate.kind) else {
                continue;
            };
            let handler = SyncHandler::new(registration, &self.manifest.root);
            progress.set_message(format!("second pass: {}", candidate.name()));
            callbacks.notify_progress(progress);

            let action = handler
                .import_item(&ctx, &candidate.node, options, callbacks)
                .unwrap_or_else(|e| {
                    SyncAction::failed(
                        candidate.node.key,
                        candidate.name(),
                        candidate.kind,
                        e.to_string(),
                    )
                });
            result.push(action);
            progress.change_count = result.change_count();
        }

        for registration in registrations {
            finish_kind(progress, registration, result, callbacks);
        }
        Ok(())
    }

    /// Topologically order the candidate set using declared references,
    /// with registry priorities breaking ties between ready items.
    fn sort_candidates(&self, candidates: &[Candidate]) -> Result<Vec<usize>> {
        let mut graph = DependencyGraph::new(0..candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let Some(registration) = self.registry.get(candidate.kind) else {
                continue;
            };
            for reference in registration.serializer.dependencies(&candidate.node) {
                // References outside the candidate set either already exist
                // in the store or fail later at the item; they cannot
                // affect ordering.
                let target = candidates.iter().position(|other| {
                    other.kind == reference.kind && other.portable_path() == reference.path
                });
                if let Some(dependency) = target {
                    graph.add_edge(index, dependency);
                }
            }
        }

        graph
            .sort(|i| self.registry.priority_of(candidates[*i].kind))
            .map_err(|e| Error::DependencyCycle {
                names: e
                    .remaining
                    .iter()
                    .map(|i| candidates[*i].name())
                    .collect(),
            })
    }

    fn run_export(
        &self,
        registrations: &[&SerializerRegistration],
        options: &HandlerOptions,
        callbacks: &SyncCallbacks,
        progress: &mut SyncProgress,
        result: &mut SyncActionResult,
    ) {
        let ctx = self.context();
        for registration in registrations {
            let handler = SyncHandler::new(registration, &self.manifest.root);
            progress.set_status(registration.kind, HandlerStatus::Processing);
            progress.set_message(format!("exporting {}", registration.folder));
            callbacks.notify_progress(progress);

            result.extend(handler.export(&ctx, options, callbacks));
            progress.change_count = result.change_count();
            finish_kind(progress, registration, result, callbacks);
        }
    }
}

fn finish_kind(
    progress: &mut SyncProgress,
    registration: &SerializerRegistration,
    result: &SyncActionResult,
    callbacks: &SyncCallbacks,
) {
    let failed = result
        .actions
        .iter()
        .any(|a| a.kind == registration.kind && !a.success);
    progress.set_status(
        registration.kind,
        if failed {
            HandlerStatus::Error
        } else {
            HandlerStatus::Complete
        },
    );
    progress.change_count = result.change_count();
    callbacks.notify_progress(progress);
}
