//! Declarative change tracking over portable nodes
//!
//! A [`TrackedItemSpec`] names the paths inside a portable node that are
//! significant for change detection. It is built once per entity kind and
//! consumed many times by [`TrackedItemSpec::compare`], which walks the spec
//! in lock-step with two nodes and produces a [`ChangeReport`].

use serde_json::Value;

use crate::change::{ChangeRecord, ChangeReport};
use crate::node::{NodeElement, PortableNode};

/// Where a repeating collection entry's match key lives and which value
/// inside each entry is compared.
#[derive(Debug, Clone)]
pub struct RepeatingSpec {
    /// Child element name (or attribute name) holding the key.
    pub key: String,
    /// Read the key from an attribute instead of a child element.
    pub key_is_attribute: bool,
    /// Relative path inside the entry to the compared value; `None` means
    /// the entry's own text value.
    pub value_path: Option<String>,
    /// Matched entries are themselves keyed collections (e.g. per-language
    /// values inside a property keyed by alias).
    pub nested: Option<Box<RepeatingSpec>>,
}

/// One significant path inside a portable node.
#[derive(Debug, Clone)]
pub struct TrackedPath {
    /// Slash-separated element path, e.g. `/Info/Name`.
    pub path: String,
    /// Display name used in change records.
    pub name: String,
    /// Read the value from this attribute of the resolved element.
    pub attribute: Option<String>,
    /// Mask values in change records.
    pub hidden: bool,
    /// Treat the resolved element as a keyed collection.
    pub repeating: Option<RepeatingSpec>,
}

/// Immutable description, per entity kind, of which node paths matter for
/// change detection. Built once, compared many times.
#[derive(Debug, Clone)]
pub struct TrackedItemSpec {
    root: String,
    paths: Vec<TrackedPath>,
}

impl TrackedItemSpec {
    /// Start a spec for nodes with the given root name.
    pub fn build(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            paths: Vec::new(),
        }
    }

    /// Track a scalar element value.
    pub fn scalar(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        self.paths.push(TrackedPath {
            path: path.into(),
            name: name.into(),
            attribute: None,
            hidden: false,
            repeating: None,
        });
        self
    }

    /// Track a scalar read from an attribute of the resolved element.
    pub fn scalar_attr(
        mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        self.paths.push(TrackedPath {
            path: path.into(),
            name: name.into(),
            attribute: Some(attribute.into()),
            hidden: false,
            repeating: None,
        });
        self
    }

    /// Track a scalar whose values are masked in reports.
    pub fn hidden(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        self.paths.push(TrackedPath {
            path: path.into(),
            name: name.into(),
            attribute: None,
            hidden: true,
            repeating: None,
        });
        self
    }

    /// Track a keyed collection; entries are matched by the value of the
    /// `key` child element (or attribute when `key_is_attribute`).
    pub fn keyed(
        mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        key_is_attribute: bool,
    ) -> Self {
        self.paths.push(TrackedPath {
            path: path.into(),
            name: name.into(),
            attribute: None,
            hidden: false,
            repeating: Some(RepeatingSpec {
                key: key.into(),
                key_is_attribute,
                value_path: None,
                nested: None,
            }),
        });
        self
    }

    /// Track a keyed collection whose matched entries are themselves keyed
    /// collections; both levels match entries by an attribute.
    pub fn keyed_nested(
        mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        nested_key: impl Into<String>,
    ) -> Self {
        self.paths.push(TrackedPath {
            path: path.into(),
            name: name.into(),
            attribute: None,
            hidden: false,
            repeating: Some(RepeatingSpec {
                key: key.into(),
                key_is_attribute: true,
                value_path: None,
                nested: Some(Box::new(RepeatingSpec {
                    key: nested_key.into(),
                    key_is_attribute: true,
                    value_path: None,
                    nested: None,
                })),
            }),
        });
        self
    }

    /// Track a keyed collection comparing a value found at a relative path
    /// inside each entry.
    pub fn keyed_value(
        mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        key: impl Into<String>,
        key_is_attribute: bool,
        value_path: impl Into<String>,
    ) -> Self {
        self.paths.push(TrackedPath {
            path: path.into(),
            name: name.into(),
            attribute: None,
            hidden: false,
            repeating: Some(RepeatingSpec {
                key: key.into(),
                key_is_attribute,
                value_path: Some(value_path.into()),
                nested: None,
            }),
        });
        self
    }

    /// Root name this spec applies to.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn paths(&self) -> &[TrackedPath] {
        &self.paths
    }

    /// Compare a (possibly absent) current node against an incoming one.
    ///
    /// - absent current classifies the whole entity as a create;
    /// - a tombstone incoming classifies it as a delete (or no change when
    ///   there is nothing to delete);
    /// - otherwise each tracked path contributes records and the overall
    ///   classification is the most significant record kind.
    ///
    /// Comparison operates on parsed values where text looks structured, so
    /// cosmetic formatting differences never register as changes.
    pub fn compare(&self, current: Option<&PortableNode>, incoming: &PortableNode) -> ChangeReport {
        if incoming.is_tombstone() {
            return match current {
                Some(_) => ChangeReport::delete(display_name(incoming)),
                None => ChangeReport::no_change(),
            };
        }

        let Some(current) = current else {
            return ChangeReport::create(display_name(incoming));
        };

        let mut records = Vec::new();
        for tracked in &self.paths {
            match &tracked.repeating {
                Some(repeating) => {
                    compare_keyed(tracked, repeating, current, incoming, &mut records);
                }
                None => compare_scalar(tracked, current, incoming, &mut records),
            }
        }

        ChangeReport::from_records(records)
    }
}

/// Human-facing name for a node: its alias attribute when present,
/// otherwise the root name.
fn display_name(node: &PortableNode) -> String {
    node.attribute("alias")
        .map(|a| a.to_string())
        .unwrap_or_else(|| node.name.clone())
}

fn compare_scalar(
    tracked: &TrackedPath,
    current: &PortableNode,
    incoming: &PortableNode,
    records: &mut Vec<ChangeRecord>,
) {
    let old = scalar_value(tracked, current);
    let new = scalar_value(tracked, incoming);

    match (old, new) {
        (None, None) => {}
        (Some(old), Some(new)) => {
            if !values_equal(&old, &new) {
                records.push(if tracked.hidden {
                    ChangeRecord::hidden(&tracked.path, &tracked.name)
                } else {
                    ChangeRecord::update(&tracked.path, &tracked.name, old, new)
                });
            }
        }
        (None, Some(new)) => records.push(if tracked.hidden {
            ChangeRecord::hidden(&tracked.path, &tracked.name)
        } else {
            ChangeRecord::create(&tracked.path, &tracked.name, new)
        }),
        (Some(old), None) => records.push(if tracked.hidden {
            ChangeRecord::hidden(&tracked.path, &tracked.name)
        } else {
            ChangeRecord::delete(&tracked.path, &tracked.name, old)
        }),
    }
}

fn scalar_value(tracked: &TrackedPath, node: &PortableNode) -> Option<String> {
    // Path "/" addresses the root node itself; only attributes live there.
    if tracked.path == "/" {
        return tracked
            .attribute
            .as_deref()
            .and_then(|a| node.attribute(a))
            .map(|v| v.to_string());
    }

    let element = node.at_path(&tracked.path)?;
    match &tracked.attribute {
        Some(attribute) => element.attribute(attribute).map(|v| v.to_string()),
        None => element.value.clone(),
    }
}

fn compare_keyed(
    tracked: &TrackedPath,
    repeating: &RepeatingSpec,
    current: &PortableNode,
    incoming: &PortableNode,
    records: &mut Vec<ChangeRecord>,
) {
    let empty: &[NodeElement] = &[];
    let current_entries = current
        .at_path(&tracked.path)
        .map(|e| e.children.as_slice())
        .unwrap_or(empty);
    let incoming_entries = incoming
        .at_path(&tracked.path)
        .map(|e| e.children.as_slice())
        .unwrap_or(empty);

    compare_entries(&tracked.path, repeating, current_entries, incoming_entries, records);
}

fn compare_entries(
    prefix: &str,
    repeating: &RepeatingSpec,
    current_entries: &[NodeElement],
    incoming_entries: &[NodeElement],
    records: &mut Vec<ChangeRecord>,
) {
    // Incoming entries drive creates and updates; matching is by key, so
    // entry order on either side is irrelevant.
    for entry in incoming_entries {
        let Some(key) = entry_key(entry, repeating) else {
            continue;
        };
        let record_path = format!("{}/{}", prefix, key);
        let matched = current_entries
            .iter()
            .find(|c| entry_key(c, repeating).as_deref() == Some(key.as_str()));

        match matched {
            Some(current_entry) => {
                if let Some(nested) = &repeating.nested {
                    compare_entries(
                        &record_path,
                        nested,
                        &current_entry.children,
                        &entry.children,
                        records,
                    );
                    continue;
                }
                let old = entry_value(current_entry, repeating);
                let new = entry_value(entry, repeating);
                match (old, new) {
                    (Some(old), Some(new)) if !values_equal(&old, &new) => {
                        records.push(ChangeRecord::update(record_path, &key, old, new));
                    }
                    (Some(old), None) => {
                        records.push(ChangeRecord::delete(record_path, &key, old));
                    }
                    (None, Some(new)) => {
                        records.push(ChangeRecord::create(record_path, &key, new));
                    }
                    _ => {}
                }
            }
            None => {
                let new = entry_value(entry, repeating).unwrap_or_default();
                records.push(ChangeRecord::create(record_path, &key, new));
            }
        }
    }

    // Current entries with no incoming counterpart are deletes.
    for entry in current_entries {
        let Some(key) = entry_key(entry, repeating) else {
            continue;
        };
        let still_present = incoming_entries
            .iter()
            .any(|i| entry_key(i, repeating).as_deref() == Some(key.as_str()));
        if !still_present {
            let old = entry_value(entry, repeating).unwrap_or_default();
            records.push(ChangeRecord::delete(
                format!("{}/{}", prefix, key),
                &key,
                old,
            ));
        }
    }
}

fn entry_key(entry: &NodeElement, repeating: &RepeatingSpec) -> Option<String> {
    if repeating.key_is_attribute {
        entry.attribute(&repeating.key).map(|v| v.to_string())
    } else {
        entry.find_value(&repeating.key).map(|v| v.to_string())
    }
}

fn entry_value(entry: &NodeElement, repeating: &RepeatingSpec) -> Option<String> {
    match &repeating.value_path {
        Some(path) => {
            let mut element = entry;
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                element = element.find(segment)?;
            }
            element.value.clone()
        }
        None => entry.value.clone(),
    }
}

/// Equality on parsed values: structured-looking text (JSON objects or
/// arrays) is compared parsed, everything else byte-for-byte.
fn values_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (parse_structured(a), parse_structured(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn parse_structured(text: &str) -> Option<Value> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(text).ok()
    } else {
        None
    }
}
