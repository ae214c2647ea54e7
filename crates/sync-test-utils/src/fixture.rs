//! [`TestSync`] builder and a representative seeded store.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use sync_node::PortableNode;
use sync_store::{Entity, EntityKind, EntityStore, MemoryStore};

/// A temporary sync root with helpers for writing portable files.
///
/// # Example
///
/// ```rust,no_run
/// use sync_test_utils::TestSync;
///
/// let sync = TestSync::new();
/// sync.write_raw("languages", "broken.json", "{ not json");
/// assert!(sync.root().join("languages/broken.json").exists());
/// ```
pub struct TestSync {
    temp_dir: TempDir,
}

impl Default for TestSync {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSync {
    /// Create an empty temporary sync root.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("TestSync: failed to create temp dir"),
        }
    }

    /// Root of the portable file tree.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a portable node under `folder`, named from the node alias.
    pub fn write_node(&self, folder: &str, node: &PortableNode) {
        let name = node.attribute("alias").unwrap_or(&node.name);
        let file = self
            .root()
            .join(folder)
            .join(sync_node::file_name(name));
        sync_node::write_node(&file, node).expect("TestSync: failed to write node");
    }

    /// Write arbitrary file content under `folder` (for corrupt-file
    /// scenarios).
    pub fn write_raw(&self, folder: &str, file: &str, content: &str) {
        let dir = self.root().join(folder);
        fs::create_dir_all(&dir).expect("TestSync: failed to create folder");
        fs::write(dir.join(file), content).expect("TestSync: failed to write file");
    }

    /// Paths of every file currently under a folder.
    pub fn files_in(&self, folder: &str) -> Vec<String> {
        let dir = self.root().join(folder);
        if !dir.exists() {
            return Vec::new();
        }
        let mut names: Vec<String> = fs::read_dir(&dir)
            .expect("TestSync: failed to read folder")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// A store populated with one representative entity of every kind,
/// including the cross-references the engine has to rewrite:
///
/// - languages `en` and `fr` (fr falls back to en)
/// - a `greeting` dictionary item with both translations
/// - a `Layout` template with an `Article Page` child
/// - data types `TextBox` and `ArticlePicker` (the picker's config embeds
///   an `element_type` reference to the `Article` content type)
/// - content types `Base` and `Article` (Article composes Base and has a
///   `title` property backed by TextBox)
/// - a `Site` content root with a `Welcome` page under it
pub fn seed_basic_store() -> MemoryStore {
    let store = MemoryStore::new();

    store
        .save(Entity::new(EntityKind::Language, "en").with_data("culture_name", json!("English")))
        .expect("seed: language en");
    store
        .save(
            Entity::new(EntityKind::Language, "fr")
                .with_data("culture_name", json!("French"))
                .with_data("fallback", json!("en")),
        )
        .expect("seed: language fr");

    store
        .save(Entity::new(EntityKind::Dictionary, "greeting").with_data(
            "translations",
            json!({"en": "Hello", "fr": "Bonjour"}),
        ))
        .expect("seed: dictionary");

    let layout = store
        .save(Entity::new(EntityKind::Template, "Layout").with_data("body", json!("<html></html>")))
        .expect("seed: layout template");
    store
        .save(
            Entity::new(EntityKind::Template, "Article Page")
                .with_parent(layout.id)
                .with_data("body", json!("<article></article>")),
        )
        .expect("seed: article template");

    let textbox = store
        .save(
            Entity::new(EntityKind::DataType, "TextBox")
                .with_data("editor_alias", json!("textbox"))
                .with_data("config", json!({"max_chars": 255})),
        )
        .expect("seed: textbox");

    let base = store
        .save(Entity::new(EntityKind::ContentType, "Base").with_data("icon", json!("icon-box")))
        .expect("seed: base content type");
    let article = store
        .save(
            Entity::new(EntityKind::ContentType, "Article")
                .with_data("icon", json!("icon-book"))
                .with_data(
                    "properties",
                    json!([{"alias": "title", "data_type": textbox.id}]),
                )
                .with_data("compositions", json!([base.id])),
        )
        .expect("seed: article content type");

    store
        .save(
            Entity::new(EntityKind::DataType, "ArticlePicker")
                .with_data("editor_alias", json!("picker"))
                .with_data("config", json!({"element_type": article.id})),
        )
        .expect("seed: article picker");

    let site = store
        .save(
            Entity::new(EntityKind::Content, "Site").with_data("content_type", json!("Article")),
        )
        .expect("seed: site");
    store
        .save(
            Entity::new(EntityKind::Content, "Welcome")
                .with_parent(site.id)
                .with_data("content_type", json!("Article"))
                .with_data(
                    "properties",
                    json!({"title": {"en": "Welcome", "fr": "Bienvenue"}}),
                ),
        )
        .expect("seed: welcome page");

    store
}
