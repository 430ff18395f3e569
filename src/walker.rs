//! Directory traversal.
//!
//! Uses the `ignore` crate's walker with all of its ignore-file filters
//! switched off: every file under a scan root is a candidate, and the only
//! filters are the explicit exclusion set and the [`FileSpecs`] name check.
//! Symbolic links to directories are never followed.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use ignore::WalkBuilder;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::errors::Diagnostics;
use crate::filter::FileSpecs;

/// Format used for file modification times.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Errors that end a directory walk.
///
/// Missing or unreadable directories are not errors at this level; they
/// are recorded in [`Diagnostics`] and the walk carries on.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("traversal failed under {path}: {message}")]
    Traversal { path: PathBuf, message: String },
}

/// Serialize a path as a string, replacing invalid UTF-8.
pub(crate) fn serialize_path_lossy<P, S>(path: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}

/// A directory to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRoot {
    /// Absolute path of the directory.
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
    /// Descend into subdirectories.
    pub recurse: bool,
}

impl ScanRoot {
    pub fn new(path: impl Into<PathBuf>, recurse: bool) -> Self {
        Self {
            path: path.into(),
            recurse,
        }
    }
}

/// A file selected for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredFile {
    /// Last-modified time, minute precision (`YYYY-mm-dd HH:MM`).
    pub modified: String,
    /// Absolute path to the file.
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
}

/// How discovered files are ordered before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    /// By full path, ignoring case.
    #[default]
    Path,
    /// By modification time, most recent first.
    ModifiedDesc,
}

/// Options for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Directories to skip, compared by exact (resolved) path.
    pub excluded: HashSet<PathBuf>,
}

impl WalkOptions {
    /// Create options excluding the given directories.
    pub fn excluding<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            excluded: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a resolved directory path is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.contains(path)
    }
}

/// Walk one scan root, appending matching files to `found`.
///
/// Directories that vanish or cannot be listed are recorded in
/// `diagnostics` and skipped. Any other I/O failure aborts the walk.
pub fn scan_root(
    root: &ScanRoot,
    specs: &FileSpecs,
    options: &WalkOptions,
    found: &mut Vec<DiscoveredFile>,
    diagnostics: &mut Diagnostics,
) -> Result<(), WalkError> {
    let root_path = resolve_path(&root.path);

    if options.is_excluded(&root_path) {
        tracing::info!("Exclude [{}]", root_path.display());
        return Ok(());
    }

    let mut builder = WalkBuilder::new(&root_path);
    builder
        .standard_filters(false)
        .follow_links(false)
        .max_depth(if root.recurse { None } else { Some(1) })
        .sort_by_file_name(|a, b| a.cmp(b));

    let excluded = options.excluded.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if is_dir && entry.depth() > 0 && excluded.contains(entry.path()) {
            tracing::info!("Exclude [{}]", entry.path().display());
            return false;
        }
        true
    });

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                let path = error_path(&err).unwrap_or(root_path.as_path()).to_path_buf();
                match err.io_error().map(io::Error::kind) {
                    Some(kind @ (io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)) => {
                        diagnostics.record(format!(
                            "ERROR ({kind:?}): Cannot scan directory {}",
                            path.display()
                        ));
                        continue;
                    }
                    _ => {
                        return Err(WalkError::Traversal {
                            path,
                            message: err.to_string(),
                        })
                    }
                }
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        // Symlinked files are scanned; only directory links are skipped.
        let is_file = entry.file_type().is_some_and(|ft| ft.is_file())
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !specs.matches(&name, diagnostics) {
            continue;
        }

        let path = entry.path();
        let modified = path
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|source| WalkError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        found.push(DiscoveredFile {
            modified: format_timestamp(modified),
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Walk every root in order and return the combined file list.
pub fn discover_files(
    roots: &[ScanRoot],
    specs: &FileSpecs,
    options: &WalkOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<DiscoveredFile>, WalkError> {
    let mut found = Vec::new();
    for root in roots {
        tracing::info!("Scanning folder [{}]", root.path.display());
        scan_root(root, specs, options, &mut found, diagnostics)?;
    }
    Ok(found)
}

/// Sort discovered files in place.
///
/// `ModifiedDesc` orders by `(modified, path)` descending, so files with the
/// same minute are in reverse path order.
pub fn sort_files(files: &mut [DiscoveredFile], order: SortOrder) {
    match order {
        SortOrder::Path => {
            files.sort_by_cached_key(|f| f.path.to_string_lossy().to_lowercase());
        }
        SortOrder::ModifiedDesc => {
            files.sort_by(|a, b| match b.modified.cmp(&a.modified) {
                Ordering::Equal => b.path.as_os_str().cmp(a.path.as_os_str()),
                other => other,
            });
        }
    }
}

/// Format a file time as local time with minute precision.
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    if let Some(Component::Normal(first)) = components.next() {
        if first == "~" {
            if let Some(home) = dirs::home_dir() {
                return home.join(components.as_path());
            }
        }
    }
    path.to_path_buf()
}

/// Make a path absolute.
///
/// Expands `~`, then canonicalizes when the path exists. Paths that do
/// not exist are joined to the current directory and normalized
/// lexically so that exclusion checks still compare equal.
pub fn resolve_path(path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    if let Ok(canonical) = expanded.canonicalize() {
        return canonical;
    }

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(expanded),
            Err(_) => expanded,
        }
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("notes.txt"), "[ ] root\n").unwrap();
        fs::write(dir.path().join("readme.txt"), "[ ] skipped\n").unwrap();
        fs::create_dir_all(dir.path().join("A")).unwrap();
        fs::write(dir.path().join("A/todo.txt"), "[ ] in A\n").unwrap();
        fs::create_dir_all(dir.path().join("B/deep")).unwrap();
        fs::write(dir.path().join("B/notes.md"), "[ ] in B\n").unwrap();
        fs::write(dir.path().join("B/deep/todo.md"), "[ ] deep in B\n").unwrap();

        dir
    }

    fn names(files: &[DiscoveredFile], root: &Path) -> Vec<String> {
        let root = resolve_path(root);
        let mut names: Vec<String> = files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        names.sort();
        names
    }

    fn scan(dir: &Path, recurse: bool, options: &WalkOptions) -> (Vec<DiscoveredFile>, Diagnostics) {
        let mut found = Vec::new();
        let mut diagnostics = Diagnostics::new();
        scan_root(
            &ScanRoot::new(dir, recurse),
            &FileSpecs::defaults(),
            options,
            &mut found,
            &mut diagnostics,
        )
        .unwrap();
        (found, diagnostics)
    }

    #[test]
    fn test_scan_without_recurse() {
        let dir = create_test_dir();
        let (found, diagnostics) = scan(dir.path(), false, &WalkOptions::default());

        assert_eq!(names(&found, dir.path()), ["notes.txt"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_scan_with_recurse() {
        let dir = create_test_dir();
        let (found, _) = scan(dir.path(), true, &WalkOptions::default());

        assert_eq!(
            names(&found, dir.path()),
            ["A/todo.txt", "B/deep/todo.md", "B/notes.md", "notes.txt"]
        );
        assert!(found.iter().all(|f| f.path.is_absolute()));
        assert!(found.iter().all(|f| f.modified.len() == 16));
    }

    #[test]
    fn test_excluded_subtree_is_skipped() {
        let dir = create_test_dir();
        let excluded = resolve_path(&dir.path().join("B"));
        let options = WalkOptions::excluding([excluded]);
        let (found, _) = scan(dir.path(), true, &options);

        assert_eq!(names(&found, dir.path()), ["A/todo.txt", "notes.txt"]);
    }

    #[test]
    fn test_exclusion_is_exact_not_prefix() {
        let dir = create_test_dir();
        // Excluding "B/dee" must not exclude "B/deep".
        let options = WalkOptions::excluding([resolve_path(&dir.path().join("B/dee"))]);
        let (found, _) = scan(dir.path(), true, &options);

        assert!(names(&found, dir.path()).contains(&"B/deep/todo.md".to_string()));
    }

    #[test]
    fn test_excluded_root_yields_nothing() {
        let dir = create_test_dir();
        let options = WalkOptions::excluding([resolve_path(dir.path())]);
        let (found, diagnostics) = scan(dir.path(), true, &options);

        assert!(found.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_root_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let (found, diagnostics) = scan(&missing, true, &WalkOptions::default());

        assert!(found.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.messages()[0].contains("Cannot scan directory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_recoverable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_test_dir();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("todo.txt"), "[ ] hidden\n").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can list it anyway.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut found = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let result = scan_root(
            &ScanRoot::new(dir.path(), true),
            &FileSpecs::defaults(),
            &WalkOptions::default(),
            &mut found,
            &mut diagnostics,
        );
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(result.is_ok());
        assert_eq!(
            names(&found, dir.path()),
            ["A/todo.txt", "B/deep/todo.md", "B/notes.md", "notes.txt"]
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.messages()[0].contains("Cannot scan directory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_symlinks_not_followed() {
        let dir = create_test_dir();
        std::os::unix::fs::symlink(dir.path().join("A"), dir.path().join("LinkToA")).unwrap();
        let (found, _) = scan(dir.path(), true, &WalkOptions::default());

        assert!(!names(&found, dir.path()).iter().any(|n| n.starts_with("LinkToA")));
    }

    #[test]
    fn test_discover_files_concatenates_roots() {
        let dir = create_test_dir();
        let roots = [
            ScanRoot::new(dir.path().join("A"), false),
            ScanRoot::new(dir.path().join("B"), false),
        ];
        let mut diagnostics = Diagnostics::new();
        let found = discover_files(
            &roots,
            &FileSpecs::defaults(),
            &WalkOptions::default(),
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found[0].path.ends_with("A/todo.txt"));
        assert!(found[1].path.ends_with("B/notes.md"));
    }

    #[test]
    fn test_sort_by_path_ignores_case() {
        let mut files = vec![
            DiscoveredFile { modified: "2024-01-01 10:00".into(), path: "/n/b.txt".into() },
            DiscoveredFile { modified: "2024-01-01 10:00".into(), path: "/n/A.txt".into() },
            DiscoveredFile { modified: "2024-01-01 10:00".into(), path: "/n/a2.txt".into() },
        ];
        sort_files(&mut files, SortOrder::Path);
        let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, ["/n/A.txt", "/n/a2.txt", "/n/b.txt"]);
    }

    #[test]
    fn test_sort_by_modified_desc() {
        let mut files = vec![
            DiscoveredFile { modified: "2024-01-01 10:00".into(), path: "/n/a.txt".into() },
            DiscoveredFile { modified: "2024-03-01 09:00".into(), path: "/n/b.txt".into() },
            DiscoveredFile { modified: "2024-01-01 10:00".into(), path: "/n/c.txt".into() },
        ];
        sort_files(&mut files, SortOrder::ModifiedDesc);
        let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, ["/n/b.txt", "/n/c.txt", "/n/a.txt"]);
    }

    #[test]
    fn test_resolve_path_normalizes_missing_paths() {
        let dir = TempDir::new().unwrap();
        let base = resolve_path(dir.path());
        let resolved = resolve_path(&base.join("x/../y/./z"));
        assert_eq!(resolved, base.join("y/z"));
    }
}
