//! Entity kind taxonomy

use serde::{Deserialize, Serialize};

/// The closed set of entity kinds the engine synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Language,
    Dictionary,
    Template,
    DataType,
    ContentType,
    Content,
}

impl EntityKind {
    /// All kinds, in default import priority order.
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Language,
            EntityKind::Dictionary,
            EntityKind::Template,
            EntityKind::DataType,
            EntityKind::ContentType,
            EntityKind::Content,
        ]
    }

    /// Root name used for portable nodes of this kind.
    pub fn node_root(&self) -> &'static str {
        match self {
            EntityKind::Language => "Language",
            EntityKind::Dictionary => "Dictionary",
            EntityKind::Template => "Template",
            EntityKind::DataType => "DataType",
            EntityKind::ContentType => "ContentType",
            EntityKind::Content => "Content",
        }
    }

    /// Default on-disk subfolder for this kind.
    pub fn folder(&self) -> &'static str {
        match self {
            EntityKind::Language => "languages",
            EntityKind::Dictionary => "dictionary",
            EntityKind::Template => "templates",
            EntityKind::DataType => "data-types",
            EntityKind::ContentType => "content-types",
            EntityKind::Content => "content",
        }
    }

    /// Kind for a portable node root name.
    pub fn from_node_root(root: &str) -> Option<Self> {
        EntityKind::all()
            .iter()
            .copied()
            .find(|k| k.node_root() == root)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.node_root())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "language" | "languages" => Ok(EntityKind::Language),
            "dictionary" => Ok(EntityKind::Dictionary),
            "template" | "templates" => Ok(EntityKind::Template),
            "data-type" | "data-types" | "datatype" => Ok(EntityKind::DataType),
            "content-type" | "content-types" | "contenttype" => Ok(EntityKind::ContentType),
            "content" => Ok(EntityKind::Content),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}
