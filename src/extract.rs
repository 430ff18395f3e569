//! To-do item extraction.
//!
//! A file is read line by line. A line whose trimmed text starts with the
//! open marker `[ ]` (or a list bullet followed by it, as in `- [ ] task`)
//! starts a block. Following lines are added to the block until a blank
//! line or the end of the file. Completed markers such as `[x]` never
//! start a block.
//!
//! The marker suffix on the first line decides the block's status:
//! `[ ]*` is flagged, `[ ]+` is elevated.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::errors::Diagnostics;
use crate::walker::{serialize_path_lossy, DiscoveredFile};

/// The open to-do marker.
pub const OPEN_MARKER: &str = "[ ]";

/// Bullets accepted in front of a list-item marker (`- [ ]`, `* [ ]`, `+ [ ]`).
pub const LIST_BULLETS: &[char] = &['-', '*', '+'];

/// Errors that can occur while reading a file for extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One to-do block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoItem {
    /// First line was marked `[ ]*`.
    pub is_flagged: bool,
    /// First line was marked `[ ]+`.
    pub is_elevated: bool,
    /// Raw lines of the block, each with its trailing newline.
    pub text: String,
    /// File the block came from.
    #[serde(serialize_with = "serialize_path_lossy")]
    pub source: PathBuf,
}

/// A scanned file and the items found in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoFile {
    pub modified: String,
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
    pub items: Vec<TodoItem>,
}

impl TodoFile {
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}

/// Status carried by the marker on a block's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct MarkerKind {
    flagged: bool,
    elevated: bool,
}

/// Classify a trimmed line, returning the marker status when it opens a block.
fn open_marker(trimmed: &str) -> Option<MarkerKind> {
    let after = trimmed.strip_prefix(OPEN_MARKER).or_else(|| {
        trimmed
            .strip_prefix(LIST_BULLETS)?
            .trim_start_matches([' ', '\t'])
            .strip_prefix(OPEN_MARKER)
    })?;

    Some(MarkerKind {
        flagged: after.starts_with('*'),
        elevated: after.starts_with('+'),
    })
}

/// Check whether a line opens a to-do block.
pub fn is_open_marker(line: &str) -> bool {
    open_marker(line.trim()).is_some()
}

struct Block {
    kind: MarkerKind,
    text: String,
}

impl Block {
    fn into_item(self, source: &Path) -> TodoItem {
        TodoItem {
            is_flagged: self.kind.flagged,
            is_elevated: self.kind.elevated,
            text: self.text,
            source: source.to_path_buf(),
        }
    }
}

/// Extract to-do items from file content.
///
/// Items come back in line order. Line endings are normalized to `\n`.
pub fn parse_items(content: &str, source: &Path) -> Vec<TodoItem> {
    let content: Cow<'_, str> = if content.contains('\r') {
        Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(content)
    };

    let mut items = Vec::new();
    // `None` while outside a block.
    let mut block: Option<Block> = None;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();

        match block.take() {
            Some(mut current) => {
                if trimmed.is_empty() {
                    if !current.text.is_empty() {
                        items.push(current.into_item(source));
                    }
                } else {
                    current.text.push_str(line);
                    block = Some(current);
                }
            }
            None => {
                if let Some(kind) = open_marker(trimmed) {
                    block = Some(Block {
                        kind,
                        text: line.to_string(),
                    });
                }
            }
        }
    }

    // File ended inside a block.
    if let Some(done) = block {
        if !done.text.is_empty() {
            items.push(done.into_item(source));
        }
    }

    items
}

/// Read a file and extract its to-do items.
///
/// Undecodable bytes are replaced rather than rejected. A file that cannot
/// be read for lack of permission yields a single flagged and elevated item
/// carrying the error message, which is also recorded in `diagnostics`.
pub fn extract_items(path: &Path, diagnostics: &mut Diagnostics) -> Result<Vec<TodoItem>, ExtractError> {
    match fs::read(path) {
        Ok(bytes) => Ok(parse_items(&String::from_utf8_lossy(&bytes), path)),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            let message = format!("ERROR (PermissionDenied): Cannot read {}", path.display());
            diagnostics.record(message.clone());
            Ok(vec![TodoItem {
                is_flagged: true,
                is_elevated: true,
                text: message,
                source: path.to_path_buf(),
            }])
        }
        Err(source) => Err(ExtractError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Extract items from a discovered file.
pub fn read_todo_file(file: &DiscoveredFile, diagnostics: &mut Diagnostics) -> Result<TodoFile, ExtractError> {
    tracing::info!("Reading file [{}]", file.path.display());
    let items = extract_items(&file.path, diagnostics)?;
    Ok(TodoFile {
        modified: file.modified.clone(),
        path: file.path.clone(),
        items,
    })
}
