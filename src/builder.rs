//! Fluent builder API for todolister.
//!
//! Provides both function composition and builder-style APIs
//! for gathering to-do items from folders of notes.

use std::path::{Path, PathBuf};

use crate::config::AppOptions;
use crate::errors::{Diagnostics, TodoListerError};
use crate::extract::{read_todo_file, TodoFile, TodoItem};
use crate::filter::{FileSpecs, MatchSpec};
use crate::tags::TagIndex;
use crate::walker::{discover_files, resolve_path, sort_files, ScanRoot, SortOrder, WalkOptions};

/// Builder for a to-do scan.
///
/// # Examples
///
/// ```no_run
/// use todolister::builder::TodoLister;
///
/// let report = TodoLister::new()
///     .root("./notes", true)
///     .exclude("./notes/archive")
///     .scan()
///     .unwrap();
///
/// println!("{} items in {} files", report.item_count(), report.files_with_items().count());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TodoLister {
    roots: Vec<ScanRoot>,
    excluded: Vec<PathBuf>,
    specs: Option<Vec<MatchSpec>>,
    sort: SortOrder,
}

impl TodoLister {
    /// Create an empty builder. Without roots, a scan finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from resolved run options.
    pub fn from_options(options: &AppOptions) -> Self {
        Self {
            roots: options.roots.clone(),
            excluded: options.excluded.clone(),
            specs: Some(options.specs.clone()),
            sort: options.sort,
        }
    }

    /// Add a folder to scan.
    pub fn root(mut self, path: impl AsRef<Path>, recurse: bool) -> Self {
        self.roots.push(ScanRoot::new(resolve_path(path.as_ref()), recurse));
        self
    }

    /// Skip a directory and everything below it.
    pub fn exclude(mut self, path: impl AsRef<Path>) -> Self {
        self.excluded.push(resolve_path(path.as_ref()));
        self
    }

    /// Replace the file-name match specs (default: [`FileSpecs::defaults`]).
    pub fn specs(mut self, specs: impl IntoIterator<Item = MatchSpec>) -> Self {
        self.specs = Some(specs.into_iter().collect());
        self
    }

    /// Also accept files matching a wildcard pattern such as `*.md`.
    pub fn add_match(mut self, pattern: impl Into<String>) -> Self {
        let specs = self.specs.get_or_insert_with(|| {
            FileSpecs::defaults().specs().cloned().collect()
        });
        specs.push(MatchSpec::Wildcard(pattern.into()));
        self
    }

    /// Set the order of files in the report.
    pub fn sort(mut self, order: SortOrder) -> Self {
        self.sort = order;
        self
    }

    /// Walk every root, read matching files and return the report.
    pub fn scan(self) -> Result<Report, TodoListerError> {
        let mut diagnostics = Diagnostics::new();

        let specs = match &self.specs {
            Some(specs) => FileSpecs::new(specs.iter().cloned()),
            None => FileSpecs::defaults(),
        };
        let walk_options = WalkOptions::excluding(self.excluded.iter().cloned());

        let mut found = discover_files(&self.roots, &specs, &walk_options, &mut diagnostics)?;
        sort_files(&mut found, self.sort);

        let mut files = Vec::with_capacity(found.len());
        for file in &found {
            files.push(read_todo_file(file, &mut diagnostics)?);
        }

        Ok(Report {
            files,
            diagnostics,
            roots: self.roots,
            excluded: self.excluded,
            sort: self.sort,
        })
    }
}

/// Result of a scan.
#[derive(Debug, Clone)]
pub struct Report {
    /// Every matching file in report order, including files with no items.
    pub files: Vec<TodoFile>,
    /// Recoverable problems met during the scan.
    pub diagnostics: Diagnostics,
    /// Folders that were scanned.
    pub roots: Vec<ScanRoot>,
    /// Folders that were skipped.
    pub excluded: Vec<PathBuf>,
    pub sort: SortOrder,
}

impl Report {
    /// Files that have at least one item.
    pub fn files_with_items(&self) -> impl Iterator<Item = &TodoFile> {
        self.files.iter().filter(|f| f.has_items())
    }

    /// All items in report order.
    pub fn all_items(&self) -> impl Iterator<Item = &TodoItem> {
        self.files.iter().flat_map(|f| f.items.iter())
    }

    /// Items marked `[ ]*`, in report order.
    pub fn flagged(&self) -> Vec<&TodoItem> {
        self.all_items().filter(|item| item.is_flagged).collect()
    }

    /// Tag index over all items.
    pub fn tags(&self) -> TagIndex<'_> {
        TagIndex::build(self.all_items())
    }

    pub fn item_count(&self) -> usize {
        self.files.iter().map(|f| f.items.len()).sum()
    }

    /// Get the scanned file for a path.
    pub fn file_for(&self, path: &Path) -> Option<&TodoFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

// ============================================================================
// Functional API
// ============================================================================

/// Scan a single folder with the default match specs.
///
/// # Examples
///
/// ```no_run
/// use todolister::builder::scan_path;
///
/// let report = scan_path("./notes", false).unwrap();
/// for item in report.flagged() {
///     print!("{}", item.text);
/// }
/// ```
pub fn scan_path(root: impl AsRef<Path>, recurse: bool) -> Result<Report, TodoListerError> {
    TodoLister::new().root(root, recurse).scan()
}

/// Scan using fully resolved run options.
pub fn scan_with_options(options: &AppOptions) -> Result<Report, TodoListerError> {
    TodoLister::from_options(options).scan()
}
