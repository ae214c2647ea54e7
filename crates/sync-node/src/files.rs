//! Portable file storage — one text file per entity

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};
use crate::node::PortableNode;

/// Extension used for portable entity files.
pub const NODE_EXTENSION: &str = "json";

/// Read and parse a portable node from a file.
pub fn read_node(path: &Path) -> Result<PortableNode> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    PortableNode::from_text(&text)
}

/// Write a portable node to a file, creating parent folders as needed.
///
/// Uses write-to-temp-then-rename with an advisory lock so a partially
/// written file is never observed under the final name.
pub fn write_node(path: &Path, node: &PortableNode) -> Result<()> {
    let text = node.to_text()?;
    write_text(path, &text)
}

/// Write text atomically to a file.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))
}

/// List all portable node files directly under a folder, sorted by file
/// name so enumeration order is deterministic across runs.
pub fn scan(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(|e| Error::io(folder, e))? {
        let entry = entry.map_err(|e| Error::io(folder, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(NODE_EXTENSION) {
            files.push(path);
        }
    }

    files.sort();
    tracing::debug!(folder = %folder.display(), count = files.len(), "scanned portable files");
    Ok(files)
}

/// File name for an entity, derived from its stable name.
///
/// Characters that are unsafe in file names are replaced so that the same
/// entity always lands in the same file on every platform.
pub fn file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '-',
        })
        .collect();
    format!("{}.{}", safe.trim_matches('-'), NODE_EXTENSION)
}
