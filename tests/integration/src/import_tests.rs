//! Import scenarios: dependency ordering, the two-pass protocol, force
//! semantics, tombstones, and item-boundary failure recovery.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

use sync_core::{Error, HandlerOptions, Manifest, SyncCallbacks, SyncEngine, SyncOperation};
use sync_node::{ChangeKind, NodeElement, PortableNode};
use sync_serializers::SerializerRegistry;
use sync_store::{walk, EntityKind, EntityStore, MemoryStore};
use sync_test_utils::{seed_basic_store, TestSync};

fn manifest_for(sync: &TestSync) -> Manifest {
    Manifest::default().with_root(sync.root())
}

/// Export the seeded store into a fresh sync tree.
fn seeded_tree(registry: &SerializerRegistry) -> (TestSync, MemoryStore) {
    let store = seed_basic_store();
    let sync = TestSync::new();
    let engine = SyncEngine::new(&store, registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Export),
            &SyncCallbacks::new(),
        )
        .expect("seed export");
    assert!(!result.has_failures());
    (sync, store)
}

fn names_of(store: &MemoryStore, kind: EntityKind) -> Vec<String> {
    let mut names: Vec<String> = walk(store, kind)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    names
}

#[test]
fn test_import_recreates_every_entity_in_an_empty_store() {
    let registry = SerializerRegistry::with_builtins();
    let (sync, seed) = seeded_tree(&registry);

    let target = MemoryStore::new();
    let engine = SyncEngine::new(&target, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert!(result.actions.iter().all(|a| a.success), "{result:?}");
    for kind in EntityKind::all() {
        assert_eq!(names_of(&target, *kind), names_of(&seed, *kind));
    }

    // Every item was new, so every action is a create.
    assert!(result
        .actions
        .iter()
        .all(|a| a.change == ChangeKind::Create));

    // The picker's element_type was a forward reference to a content type
    // that did not exist during the data-type pass; it was deferred, so
    // its action comes last, and the reference now points at the target
    // store's own Article entity.
    let last = result.actions.last().unwrap();
    assert_eq!(last.name, "ArticlePicker");

    let article_id = walk(&target, EntityKind::ContentType)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Article")
        .unwrap()
        .id;
    let picker = walk(&target, EntityKind::DataType)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "ArticlePicker")
        .unwrap();
    assert_eq!(picker.data.get("config").unwrap()["element_type"], json!(article_id));

    // Tree positions survived: Welcome hangs under Site.
    let site = walk(&target, EntityKind::Content)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Site")
        .unwrap();
    let welcome = walk(&target, EntityKind::Content)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Welcome")
        .unwrap();
    assert_eq!(welcome.parent_id, Some(site.id));
}

#[test]
fn test_reimporting_identical_files_writes_nothing() {
    let registry = SerializerRegistry::with_builtins();
    let (sync, _) = seeded_tree(&registry);

    let target = MemoryStore::new();
    let engine = SyncEngine::new(&target, &registry, manifest_for(&sync));
    engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();
    let saves_after_first = target.saves();

    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert!(result
        .actions
        .iter()
        .all(|a| a.change == ChangeKind::NoChange));
    assert_eq!(target.saves(), saves_after_first);
}

#[rstest]
#[case(false, 0)]
#[case(true, 1)]
fn test_force_bypasses_the_no_change_skip(#[case] force: bool, #[case] expected_writes: usize) {
    let registry = SerializerRegistry::with_builtins();
    let store = seed_basic_store();
    let sync = TestSync::new();

    // Export only the dictionary so the run has exactly one candidate.
    let mut manifest = manifest_for(&sync);
    manifest.sets.insert(
        "dict".to_string(),
        sync_core::HandlerSet {
            handlers: vec!["dictionary".to_string()],
        },
    );

    let engine = SyncEngine::new(&store, &registry, manifest);
    engine
        .run(
            HandlerOptions::new(SyncOperation::Export).with_set("dict"),
            &SyncCallbacks::new(),
        )
        .unwrap();

    let saves_before = store.saves();
    let mut options = HandlerOptions::new(SyncOperation::Import).with_set("dict");
    if force {
        options = options.with_force();
    }
    let result = engine.run(options, &SyncCallbacks::new()).unwrap();

    assert_eq!(result.actions.len(), 1);
    assert_eq!(result.actions[0].change, ChangeKind::NoChange);
    assert_eq!(store.saves() - saves_before, expected_writes);
}

#[test]
fn test_dependency_beats_file_order() {
    // Files arrive as [Apple, Zoo] (sorted), but Apple lives under Zoo.
    let registry = SerializerRegistry::with_builtins();
    let store = seed_basic_store();
    let sync = TestSync::new();

    let zoo = PortableNode::new("Content", Uuid::new_v4())
        .attr("alias", "Zoo")
        .child(NodeElement::new("Info").child(NodeElement::with_value("ContentType", "Article")))
        .child(NodeElement::new("Properties"));
    let apple = PortableNode::new("Content", Uuid::new_v4())
        .attr("alias", "Apple")
        .with_parent("/Zoo")
        .child(NodeElement::new("Info").child(NodeElement::with_value("ContentType", "Article")))
        .child(NodeElement::new("Properties"));
    sync.write_node("content", &zoo);
    sync.write_node("content", &apple);

    let written = Rc::new(RefCell::new(Vec::new()));
    let written_inner = written.clone();
    let callbacks = SyncCallbacks::new().on_item_saving(move |notice| {
        written_inner.borrow_mut().push(notice.name.clone());
        true
    });

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(HandlerOptions::new(SyncOperation::Import), &callbacks)
        .unwrap();

    assert!(result.actions.iter().all(|a| a.success));
    assert_eq!(*written.borrow(), vec!["Zoo".to_string(), "Apple".to_string()]);

    let zoo_entity = walk(&store, EntityKind::Content)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Zoo")
        .unwrap();
    let apple_entity = walk(&store, EntityKind::Content)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Apple")
        .unwrap();
    assert_eq!(apple_entity.parent_id, Some(zoo_entity.id));
}

#[test]
fn test_one_bad_file_fails_alone() {
    let registry = SerializerRegistry::with_builtins();
    let (sync, _) = seeded_tree(&registry);
    sync.write_raw("languages", "broken.json", "{ this is not json");

    let target = MemoryStore::new();
    let engine = SyncEngine::new(&target, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();

    // Eleven good files and one bad one: twelve actions, one failed.
    assert_eq!(result.actions.len(), 12);
    assert_eq!(result.actions.iter().filter(|a| !a.success).count(), 1);
    assert!(result.has_failures());

    let failed = result.actions.iter().find(|a| !a.success).unwrap();
    assert_eq!(failed.name, "broken");
    assert_eq!(failed.change, ChangeKind::Fail);
    assert!(failed.message.is_some());

    // The rest of the run still applied.
    assert_eq!(names_of(&target, EntityKind::Language), vec!["en", "fr"]);
    assert_eq!(names_of(&target, EntityKind::Content), vec!["Site", "Welcome"]);
}

#[test]
fn test_tombstone_deletes_the_live_entity() {
    let registry = SerializerRegistry::with_builtins();
    let store = seed_basic_store();
    let sync = TestSync::new();

    let greeting_key = store.get_by_id(3).unwrap().expect("greeting").key;
    let tombstone = PortableNode::tombstone("Dictionary", greeting_key).attr("alias", "greeting");
    sync.write_node("dictionary", &tombstone);

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();

    let delete = result
        .actions
        .iter()
        .find(|a| a.kind == EntityKind::Dictionary)
        .unwrap();
    assert_eq!(delete.change, ChangeKind::Delete);
    assert!(delete.success);
    assert!(store.get_by_key(greeting_key).unwrap().is_none());

    // Deleting what is already gone is a no-op, not an error.
    let again = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();
    let noop = again
        .actions
        .iter()
        .find(|a| a.kind == EntityKind::Dictionary)
        .unwrap();
    assert_eq!(noop.change, ChangeKind::NoChange);
}

#[test]
fn test_item_veto_skips_exactly_one_item() {
    let registry = SerializerRegistry::with_builtins();
    let (sync, store) = seeded_tree(&registry);

    // Drift two entities so the import has two real changes.
    let mut greeting = store.get_by_id(3).unwrap().expect("greeting");
    greeting.set_data("translations", json!({"en": "Hi"}));
    store.save(greeting).unwrap();
    let mut textbox = store.get_by_id(6).unwrap().expect("textbox");
    textbox.set_data("config", json!({"max_chars": 40}));
    store.save(textbox).unwrap();

    let callbacks = SyncCallbacks::new().on_item_saving(|notice| notice.name != "greeting");

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(HandlerOptions::new(SyncOperation::Import), &callbacks)
        .unwrap();

    let greeting_action = result
        .actions
        .iter()
        .find(|a| a.name == "greeting")
        .unwrap();
    assert_eq!(greeting_action.change, ChangeKind::NoChange);
    assert!(greeting_action.success);
    assert_eq!(greeting_action.message.as_deref(), Some("vetoed by observer"));

    // The vetoed item kept its drifted value; the other one was restored.
    let greeting = store.get_by_id(3).unwrap().unwrap();
    assert_eq!(
        greeting.data.get("translations").unwrap(),
        &json!({"en": "Hi"})
    );
    let textbox = store.get_by_id(6).unwrap().unwrap();
    assert_eq!(
        textbox.data.get("config").unwrap(),
        &json!({"max_chars": 255})
    );
}

#[test]
fn test_composition_cycle_is_fatal() {
    let registry = SerializerRegistry::with_builtins();
    let store = MemoryStore::new();
    let sync = TestSync::new();

    let one = PortableNode::new("ContentType", Uuid::new_v4())
        .attr("alias", "One")
        .child(NodeElement::new("Info").child(NodeElement::with_value("Icon", "icon-a")))
        .child(NodeElement::new("Properties"))
        .child(NodeElement::with_value("Compositions", r#"["/Two"]"#));
    let two = PortableNode::new("ContentType", Uuid::new_v4())
        .attr("alias", "Two")
        .child(NodeElement::new("Info").child(NodeElement::with_value("Icon", "icon-b")))
        .child(NodeElement::new("Properties"))
        .child(NodeElement::with_value("Compositions", r#"["/One"]"#));
    sync.write_node("content-types", &one);
    sync.write_node("content-types", &two);

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let err = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap_err();

    match err {
        Error::DependencyCycle { mut names } => {
            names.sort();
            assert_eq!(names, vec!["One", "Two"]);
        }
        other => panic!("expected a cycle error, got {other}"),
    }
    assert_eq!(store.saves(), 0);
}

#[test]
fn test_data_type_forward_reference_resolves_in_second_pass() {
    // A picker file that references a content type which only exists as a
    // candidate in the same run: pass one defers it, pass two lands it.
    let registry = SerializerRegistry::with_builtins();
    let store = MemoryStore::new();
    let sync = TestSync::new();

    let picker = PortableNode::new("DataType", Uuid::new_v4())
        .attr("alias", "Picker")
        .child(NodeElement::new("Info").child(NodeElement::with_value("EditorAlias", "picker")))
        .child(NodeElement::with_value(
            "Config",
            r#"{"element_type":"/Target"}"#,
        ));
    let target_type = PortableNode::new("ContentType", Uuid::new_v4())
        .attr("alias", "Target")
        .child(NodeElement::new("Info").child(NodeElement::with_value("Icon", "icon-t")))
        .child(NodeElement::new("Properties"))
        .child(NodeElement::with_value("Compositions", "[]"));
    sync.write_node("data-types", &picker);
    sync.write_node("content-types", &target_type);

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert!(result.actions.iter().all(|a| a.success), "{result:?}");
    // Deferred items land after everything else.
    assert_eq!(result.actions.last().unwrap().name, "Picker");

    let target_id = walk(&store, EntityKind::ContentType)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Target")
        .unwrap()
        .id;
    let picker_entity = walk(&store, EntityKind::DataType)
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Picker")
        .unwrap();
    assert_eq!(
        picker_entity.data.get("config").unwrap()["element_type"],
        json!(target_id)
    );
}

#[test]
fn test_unresolvable_reference_fails_after_second_pass() {
    let registry = SerializerRegistry::with_builtins();
    let store = MemoryStore::new();
    let sync = TestSync::new();

    let picker = PortableNode::new("DataType", Uuid::new_v4())
        .attr("alias", "Picker")
        .child(NodeElement::new("Info").child(NodeElement::with_value("EditorAlias", "picker")))
        .child(NodeElement::with_value(
            "Config",
            r#"{"element_type":"/Nowhere"}"#,
        ));
    sync.write_node("data-types", &picker);

    let engine = SyncEngine::new(&store, &registry, manifest_for(&sync));
    let result = engine
        .run(
            HandlerOptions::new(SyncOperation::Import),
            &SyncCallbacks::new(),
        )
        .unwrap();

    assert_eq!(result.actions.len(), 1);
    let action = &result.actions[0];
    assert!(!action.success);
    assert!(action.message.as_deref().unwrap().contains("/Nowhere"));
}
