//! Entity ⇄ portable node conversion for Content Sync Manager
//!
//! One serializer per entity kind, a shared context for reference
//! resolution, and the registry that binds kind, priority, folder,
//! serializer, and tracked spec together for the orchestrator.

pub mod content;
pub mod content_type;
pub mod context;
pub mod data_type;
pub mod dictionary;
pub mod error;
pub mod language;
pub mod registry;
pub mod serializer;
pub mod template;

pub use content::ContentSerializer;
pub use content_type::ContentTypeSerializer;
pub use context::SerializeContext;
pub use data_type::DataTypeSerializer;
pub use dictionary::DictionarySerializer;
pub use error::{Error, Result};
pub use language::LanguageSerializer;
pub use registry::{SerializerRegistration, SerializerRegistry};
pub use serializer::{EntitySerializer, GenericSerializer, NodeReference};
pub use template::TemplateSerializer;
