//! Whole-run engine tests: export, report, notifications, and run
//! configuration errors.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use sync_core::{
    Error, HandlerOptions, HandlerStatus, Manifest, SyncCallbacks, SyncEngine, SyncOperation,
};
use sync_serializers::SerializerRegistry;
use sync_store::{EntityKind, EntityStore, MemoryStore};
use sync_test_utils::{seed_basic_store, TestSync};

fn manifest_for(sync: &TestSync) -> Manifest {
    Manifest::default().with_root(sync.root())
}

fn export_all(store: &MemoryStore, registry: &SerializerRegistry, sync: &TestSync) {
    let engine = SyncEngine::new(store, registry, manifest_for(sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Export),
            &SyncCallbacks::new(),
        )
        .expect("export run");
    assert!(!result.has_failures(), "seed export must be clean");
}

#[test]
fn test_export_writes_one_file_per_entity() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();
    export_all(&store, &registry, &sync);

    assert_eq!(sync.files_in("languages"), vec!["en.json", "fr.json"]);
    assert_eq!(sync.files_in("dictionary"), vec!["greeting.json"]);
    assert_eq!(
        sync.files_in("templates"),
        vec!["Article-Page.json", "Layout.json"]
    );
    assert_eq!(
        sync.files_in("data-types"),
        vec!["ArticlePicker.json", "TextBox.json"]
    );
    assert_eq!(
        sync.files_in("content-types"),
        vec!["Article.json", "Base.json"]
    );
    assert_eq!(sync.files_in("content"), vec!["Site.json", "Welcome.json"]);
}

#[test]
fn test_second_export_changes_nothing() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();
    export_all(&store, &registry, &sync);

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Export),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert_eq!(result.change_count(), 0);
    assert!(result.is_clean());
}

#[test]
fn test_export_rewrites_only_the_changed_entity() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();
    export_all(&store, &registry, &sync);

    let mut greeting = store
        .get_by_key(store.entities()[2].key)
        .unwrap()
        .expect("greeting entity");
    assert_eq!(greeting.name, "greeting");
    greeting.set_data("translations", json!({"en": "Hi", "fr": "Bonjour"}));
    store.save(greeting).unwrap();

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Export),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert_eq!(result.change_count(), 1);
    let changed: Vec<_> = result
        .actions
        .iter()
        .filter(|a| a.change.is_change())
        .collect();
    assert_eq!(changed[0].name, "greeting");
    assert_eq!(changed[0].kind, EntityKind::Dictionary);
}

#[test]
fn test_report_reads_fresh_data_and_never_writes() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();
    export_all(&store, &registry, &sync);

    // Mutate the live store after the export; the report must see it.
    let mut greeting = store.get_by_id(3).unwrap().expect("greeting entity");
    greeting.set_data("translations", json!({"en": "Hi", "fr": "Bonjour"}));
    store.save(greeting).unwrap();
    let saves_before = store.saves();

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Report),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert_eq!(result.change_count(), 1);
    assert_eq!(store.saves(), saves_before);
}

#[test]
fn test_bulk_veto_is_a_clean_early_exit() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();
    export_all(&store, &registry, &sync);

    let fresh = MemoryStore::new();
    let engine = SyncEngine::new(&fresh, &registry, manifest_for(&sync));
    let callbacks = SyncCallbacks::new().on_run_starting(|notice| {
        assert_eq!(notice.operation, SyncOperation::Import);
        false
    });

    let result = engine
        .run(HandlerOptions::new(SyncOperation::Import), &callbacks)
        .unwrap();

    assert!(result.cancelled);
    assert!(result.actions.is_empty());
    assert_eq!(fresh.lookups(), 0);
    assert_eq!(fresh.saves(), 0);
}

#[test]
fn test_completed_notification_carries_the_result() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();

    let seen = Rc::new(RefCell::new(None));
    let seen_inner = seen.clone();
    let callbacks = SyncCallbacks::new().on_run_completed(move |result| {
        *seen_inner.borrow_mut() = Some(result.actions.len());
    });

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(HandlerOptions::new(SyncOperation::Export), &callbacks)
        .unwrap();

    assert_eq!(*seen.borrow(), Some(result.actions.len()));
}

#[test]
fn test_progress_reaches_complete_for_every_handler() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();

    let last = Rc::new(RefCell::new(None));
    let last_inner = last.clone();
    let callbacks = SyncCallbacks::new().on_progress(move |progress| {
        *last_inner.borrow_mut() = Some(progress.clone());
    });

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    engine
        .run(HandlerOptions::new(SyncOperation::Export), &callbacks)
        .unwrap();

    let progress = last.borrow().clone().expect("progress was pushed");
    assert_eq!(progress.handlers.len(), EntityKind::all().len());
    assert!(progress
        .handlers
        .iter()
        .all(|h| h.status == HandlerStatus::Complete));
}

#[test]
fn test_unknown_handler_set_fails_before_any_item() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let err = engine
        .run(
            HandlerOptions::new(SyncOperation::Export).with_set("nope"),
            &SyncCallbacks::new(),
        )
        .unwrap_err();

    assert!(matches!(err, Error::UnknownHandlerSet { .. }));
    assert_eq!(store.lookups(), 0);
}

#[test]
fn test_missing_root_fails_import_before_any_item() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let manifest = Manifest::default().with_root("/definitely/not/here");

    let engine = SyncEngine::new(&store, &registry, manifest);
    let err = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::MissingRoot { .. }));
}

#[test]
fn test_restricted_set_only_touches_its_kinds() {
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();

    let mut manifest = manifest_for(&sync);
    manifest.sets.insert(
        "settings".to_string(),
        sync_core::HandlerSet {
            handlers: vec!["data-types".to_string(), "content-types".to_string()],
        },
    );

    let engine = SyncEngine::new(&store, &registry, manifest);
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Export).with_set("settings"),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert!(result
        .actions
        .iter()
        .all(|a| matches!(a.kind, EntityKind::DataType | EntityKind::ContentType)));
    assert!(sync.files_in("languages").is_empty());
    assert_eq!(
        sync.files_in("data-types"),
        vec!["ArticlePicker.json", "TextBox.json"]
    );
}

#[test]
fn test_entities_stay_available_across_runs() {
    // Two runs against one engine: the cache is cleared between them, so
    // the second run re-reads the store rather than reusing entries.
    let store = seed_basic_store();
    let registry = SerializerRegistry::with_builtins();
    let sync = TestSync::new();
    export_all(&store, &registry, &sync);

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let first = engine
        .run(
            HandlerOptions::new(SyncOperation::Report),
            &SyncCallbacks::new(),
        )
        .unwrap();
    assert_eq!(first.change_count(), 0);

    let mut site = store.get_by_id(10).unwrap().expect("site entity");
    assert_eq!(site.name, "Site");
    site.set_data("content_type", json!("Base"));
    store.save(site).unwrap();

    let second = engine
        .run(
            HandlerOptions::new(SyncOperation::Report),
            &SyncCallbacks::new(),
        )
        .unwrap();
    assert_eq!(second.change_count(), 1);
}
