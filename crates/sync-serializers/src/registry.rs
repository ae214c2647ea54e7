//! Serializer registry
//!
//! An explicit startup-time list of registrations — kind, priority, folder,
//! serializer, tracked spec — sorted by priority once. Priorities are data
//! on the registration, so adding a kind never means editing a sort.

use sync_node::TrackedItemSpec;
use sync_store::EntityKind;

use crate::content::ContentSerializer;
use crate::content_type::ContentTypeSerializer;
use crate::data_type::DataTypeSerializer;
use crate::dictionary::DictionarySerializer;
use crate::language::LanguageSerializer;
use crate::serializer::{EntitySerializer, GenericSerializer};
use crate::template::TemplateSerializer;

/// Everything the orchestrator needs to run one entity kind.
pub struct SerializerRegistration {
    pub kind: EntityKind,
    /// Import order between kinds; lower runs first.
    pub priority: i32,
    /// Subfolder of the sync root holding this kind's files.
    pub folder: String,
    pub serializer: Box<dyn EntitySerializer>,
    pub spec: TrackedItemSpec,
}

/// The registry: registrations held sorted by priority.
pub struct SerializerRegistry {
    registrations: Vec<SerializerRegistration>,
}

impl SerializerRegistry {
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Registry with all built-in kinds at their default priorities.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for registration in builtin_registrations() {
            registry.register(registration);
        }
        registry
    }

    /// Add a registration, keeping the list sorted by priority (ties keep
    /// registration order).
    pub fn register(&mut self, registration: SerializerRegistration) {
        self.registrations.push(registration);
        self.registrations.sort_by_key(|r| r.priority);
    }

    /// Register a kind with the pass-through fallback serializer.
    pub fn register_generic(&mut self, kind: EntityKind, priority: i32) {
        self.register(SerializerRegistration {
            kind,
            priority,
            folder: kind.folder().to_string(),
            serializer: Box::new(GenericSerializer::new(kind)),
            spec: TrackedItemSpec::build(kind.node_root())
                .scalar_attr("/", "Alias", "alias")
                .scalar("/Payload", "Payload"),
        });
    }

    pub fn get(&self, kind: EntityKind) -> Option<&SerializerRegistration> {
        self.registrations.iter().find(|r| r.kind == kind)
    }

    /// Priority used for dependency-sort tie-breaking; unknown kinds sort
    /// last.
    pub fn priority_of(&self, kind: EntityKind) -> i32 {
        self.get(kind).map(|r| r.priority).unwrap_or(i32::MAX)
    }

    /// Registrations in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &SerializerRegistration> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn builtin_registrations() -> Vec<SerializerRegistration> {
    vec![
        SerializerRegistration {
            kind: EntityKind::Language,
            priority: 10,
            folder: EntityKind::Language.folder().to_string(),
            serializer: Box::new(LanguageSerializer),
            spec: TrackedItemSpec::build("Language")
                .scalar_attr("/", "Alias", "alias")
                .scalar("/Info/CultureName", "Culture Name")
                .scalar("/Info/Fallback", "Fallback"),
        },
        SerializerRegistration {
            kind: EntityKind::Dictionary,
            priority: 20,
            folder: EntityKind::Dictionary.folder().to_string(),
            serializer: Box::new(DictionarySerializer),
            spec: TrackedItemSpec::build("Dictionary")
                .scalar_attr("/", "Alias", "alias")
                .keyed("/Translations", "Translations", "lang", true),
        },
        SerializerRegistration {
            kind: EntityKind::Template,
            priority: 30,
            folder: EntityKind::Template.folder().to_string(),
            serializer: Box::new(TemplateSerializer),
            spec: TrackedItemSpec::build("Template")
                .scalar_attr("/", "Alias", "alias")
                .scalar("/Body", "Body"),
        },
        SerializerRegistration {
            kind: EntityKind::DataType,
            priority: 40,
            folder: EntityKind::DataType.folder().to_string(),
            serializer: Box::new(DataTypeSerializer),
            spec: TrackedItemSpec::build("DataType")
                .scalar_attr("/", "Alias", "alias")
                .scalar("/Info/EditorAlias", "Editor Alias")
                .scalar("/Config", "Config"),
        },
        SerializerRegistration {
            kind: EntityKind::ContentType,
            priority: 50,
            folder: EntityKind::ContentType.folder().to_string(),
            serializer: Box::new(ContentTypeSerializer),
            spec: TrackedItemSpec::build("ContentType")
                .scalar_attr("/", "Alias", "alias")
                .scalar("/Info/Icon", "Icon")
                .keyed_value("/Properties", "Properties", "alias", true, "Type")
                .scalar("/Compositions", "Compositions"),
        },
        SerializerRegistration {
            kind: EntityKind::Content,
            priority: 60,
            folder: EntityKind::Content.folder().to_string(),
            serializer: Box::new(ContentSerializer),
            spec: TrackedItemSpec::build("Content")
                .scalar_attr("/", "Alias", "alias")
                .scalar("/Info/ContentType", "Content Type")
                .keyed_nested("/Properties", "Properties", "alias", "lang"),
        },
    ]
}
