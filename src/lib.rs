//! Todolister - Gather open to-do items from folders of notes.
//!
//! Todolister scans folders for note files whose names match a set of
//! patterns, pulls out every block that starts with an open `[ ]` marker,
//! and writes a report grouped by file, with flagged and hashtagged items
//! collected in their own sections.
//!
//! # Quick Start
//!
//! ```no_run
//! use todolister::builder::TodoLister;
//!
//! let report = TodoLister::new()
//!     .root("./notes", true)
//!     .add_match("*.md")
//!     .scan()
//!     .unwrap();
//!
//! println!("Found {} items", report.item_count());
//! for (tag, items) in report.tags().iter() {
//!     println!("{tag}: {}", items.len());
//! }
//! ```
//!
//! # Modules
//!
//! - [`filter`] - File name match specs
//! - [`walker`] - Folder traversal with exclusions
//! - [`extract`] - To-do block extraction
//! - [`tags`] - Hashtag index
//! - [`options`] - Options file grammar
//! - [`config`] - Command-line and options-file resolution
//! - [`builder`] - Fluent API for a scan
//! - [`output`] - HTML, text and JSON reports
//! - [`browser`] - Opening the HTML report
//!
//! # Markers
//!
//! - `[ ]` open item
//! - `[ ]*` flagged item, also listed under Flagged Items
//! - `[ ]+` elevated item, shown in bold
//! - `- [ ]` list-item form of any of the above

pub mod filter;
pub mod errors;
pub mod walker;
pub mod extract;
pub mod tags;
pub mod options;
pub mod config;
pub mod output;
pub mod builder;
pub mod browser;

// Re-export key types at crate root for convenience
pub use builder::{Report, TodoLister};
pub use config::{AppOptions, Arguments};
pub use errors::{Diagnostics, TodoListerError};
pub use extract::{ExtractError, TodoFile, TodoItem};
pub use filter::{FileSpecs, MatchSpec};
pub use output::OutputError;
pub use tags::TagIndex;
pub use walker::{ScanRoot, SortOrder, WalkError};
