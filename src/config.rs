//! Run configuration.
//!
//! Combines command-line arguments with an optional options file into
//! the settings a run needs. Switches found in the options file win over
//! command-line flags; the output file name from the options file is only
//! used when none was given on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::TodoListerError;
use crate::filter::{FileSpecs, MatchSpec, DEFAULT_FILE_SPECS};
use crate::options::{
    strip_quotes, OptionsFile, Prompt, SECTION_EXCLUDE, SECTION_MATCH, SECTION_OUTPUT,
};
use crate::walker::{resolve_path, ScanRoot, SortOrder, WalkOptions};

/// Default report file name, created in the current directory.
pub const DEFAULT_OUTPUT_FILE: &str = "from-todolister.html";

/// Default HTML page title.
pub const DEFAULT_PAGE_TITLE: &str = "ToDo Items";

/// Command-line arguments as given by the user.
#[derive(Debug, Clone)]
pub struct Arguments {
    pub folders: Vec<PathBuf>,
    pub options_file: Option<PathBuf>,
    pub recurse: bool,
    pub by_mtime: bool,
    pub output_file: Option<PathBuf>,
    pub do_text: bool,
    pub do_text_dt: bool,
    pub do_json: bool,
    pub no_html: bool,
    /// Semicolon-separated directories to skip.
    pub exclude_path: String,
    /// Extra wildcard patterns, tried after the regex specs.
    pub add_match: Vec<String>,
    pub page_title: String,
    pub no_browser: bool,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            options_file: None,
            recurse: false,
            by_mtime: false,
            output_file: None,
            do_text: false,
            do_text_dt: false,
            do_json: false,
            no_html: false,
            exclude_path: String::new(),
            add_match: Vec::new(),
            page_title: DEFAULT_PAGE_TITLE.to_string(),
            no_browser: false,
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub roots: Vec<ScanRoot>,
    pub excluded: Vec<PathBuf>,
    pub specs: Vec<MatchSpec>,
    pub sort: SortOrder,
    /// Output path before suffix handling (see [`crate::output::output_path`]).
    pub output_file: PathBuf,
    pub do_text: bool,
    pub do_text_dt: bool,
    pub do_json: bool,
    pub no_html: bool,
    pub page_title: String,
    pub no_browser: bool,
}

impl AppOptions {
    /// Resolve arguments against the options file they name, if any.
    ///
    /// Fails when the options file or a command-line folder does not exist.
    pub fn resolve(args: Arguments, prompt: &mut dyn Prompt) -> Result<Self, TodoListerError> {
        let opts = match &args.options_file {
            Some(path) => load_options_file(path)?,
            None => OptionsFile::empty(),
        };
        Self::resolve_with(args, &opts, prompt)
    }

    /// Resolve arguments against already-parsed options.
    pub fn resolve_with(
        args: Arguments,
        opts: &OptionsFile,
        prompt: &mut dyn Prompt,
    ) -> Result<Self, TodoListerError> {
        let output_file = match args.output_file {
            Some(path) => path,
            None => match opts.value(SECTION_OUTPUT, "filename") {
                Some(name) => PathBuf::from(name),
                None => std::env::current_dir()?.join(DEFAULT_OUTPUT_FILE),
            },
        };

        let mut roots = Vec::new();
        for folder in &args.folders {
            let path = resolve_path(folder);
            tracing::info!("Folder {}", path.display());
            if !path.exists() {
                return Err(TodoListerError::PathNotFound(path));
            }
            roots.push(ScanRoot::new(path, args.recurse));
        }

        if roots.is_empty() {
            roots.extend(
                opts.folders()
                    .into_iter()
                    .map(|(folder, recurse)| ScanRoot::new(resolve_path(Path::new(&folder)), recurse)),
            );
        }

        if roots.is_empty() {
            roots.push(ScanRoot::new(std::env::current_dir()?, false));
        }

        let mut excluded: Vec<PathBuf> = strip_quotes(&args.exclude_path)
            .split(';')
            .filter(|s| !s.trim().is_empty())
            .map(|s| resolve_path(Path::new(s.trim())))
            .collect();
        excluded.extend(
            opts.list(SECTION_EXCLUDE)
                .iter()
                .map(|s| resolve_path(Path::new(s))),
        );

        let mut specs: Vec<MatchSpec> = opts
            .list(SECTION_MATCH)
            .into_iter()
            .map(MatchSpec::Regex)
            .collect();
        if specs.is_empty() {
            specs = DEFAULT_FILE_SPECS
                .iter()
                .map(|s| MatchSpec::Regex((*s).to_string()))
                .collect();
        }
        specs.extend(
            args.add_match
                .iter()
                .map(|s| strip_quotes(s))
                .filter(|s| !s.is_empty())
                .map(|s| MatchSpec::Wildcard(s.to_string())),
        );

        let by_mtime = opts
            .switch(
                "by_modified_time_desc",
                "Sort by file-modified time in descending order (y/N)?",
                prompt,
            )?
            .unwrap_or(args.by_mtime);
        let do_text = opts
            .switch("do_text_file", "Create text file output (y/N)?", prompt)?
            .unwrap_or(args.do_text);
        let do_text_dt = opts
            .switch(
                "do_text_file_dt",
                "Create text file output with date_time in file name (y/N)?",
                prompt,
            )?
            .unwrap_or(args.do_text_dt);
        let do_json = opts
            .switch("do_json_file", "Create JSON file output (y/N)?", prompt)?
            .unwrap_or(args.do_json);
        let no_html = opts
            .switch("no_html", "Skip creating HTML file output (y/N)?", prompt)?
            .unwrap_or(args.no_html);
        let page_title = opts
            .value(SECTION_OUTPUT, "title")
            .unwrap_or(args.page_title);

        Ok(Self {
            roots,
            excluded,
            specs,
            sort: if by_mtime {
                SortOrder::ModifiedDesc
            } else {
                SortOrder::Path
            },
            output_file,
            do_text,
            do_text_dt,
            do_json,
            no_html,
            page_title,
            no_browser: args.no_browser,
        })
    }

    /// Compiled match specs.
    pub fn file_specs(&self) -> FileSpecs {
        FileSpecs::new(self.specs.iter().cloned())
    }

    /// Walker options carrying the exclusion set.
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions::excluding(self.excluded.iter().cloned())
    }
}

/// Read and parse an options file.
pub fn load_options_file(path: &Path) -> Result<OptionsFile, TodoListerError> {
    let path = resolve_path(path);
    if !path.exists() {
        return Err(TodoListerError::OptionsFileNotFound(path));
    }
    let bytes = fs::read(&path)?;
    Ok(OptionsFile::from_text(&String::from_utf8_lossy(&bytes)))
}
