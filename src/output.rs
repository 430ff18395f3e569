//! Output formatting for todolister.
//!
//! Renders a scan [`Report`] as a self-contained HTML page, a plain text
//! listing, or JSON, and writes the results next to each other using one
//! base file name.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::builder::Report;
use crate::config::AppOptions;
use crate::errors::Diagnostics;
use crate::extract::{TodoFile, TodoItem};
use crate::filter::FileSpecs;
use crate::tags::TagIndex;
use crate::walker::{resolve_path, serialize_path_lossy, ScanRoot, SortOrder};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Format of the "Created" footer time.
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format of the date-time added to text file names.
pub const FILE_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";

const STYLE: &str = include_str!("style.css");

const TEXT_SEPARATOR_WIDTH: usize = 70;

/// Program name and version as shown in footers.
pub fn app_title() -> String {
    format!("todolister (v.{})", env!("CARGO_PKG_VERSION"))
}

fn created_line(run_time: &DateTime<Local>) -> String {
    format!("Created {} by {}.\n", run_time.format(CREATED_FORMAT), app_title())
}

// ============================================================================
// HTML
// ============================================================================

/// Escape item text for HTML and turn newlines into `<br />`.
pub fn html_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', "<br />")
}

/// Escape text for use in element content or a quoted attribute.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Anchor id for a file path.
pub fn as_link_name(file_name: &str) -> String {
    file_name
        .trim_matches(|c| matches!(c, ' ' | '/' | '\\'))
        .replace(' ', "_")
        .replace('/', "-")
        .replace('.', "-")
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn html_head(title: &str) -> String {
    let mut s = String::with_capacity(STYLE.len() + 512);
    s.push_str("<!DOCTYPE html>\n");
    s.push_str("<html lang=\"en\">\n");
    s.push_str("<head>\n");
    s.push_str("    <meta charset=\"UTF-8\">\n");
    s.push_str("    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    s.push_str(&format!("    <title>{}</title>\n", escape(title)));
    s.push_str("    <style>\n");
    for line in STYLE.lines().filter(|l| !l.trim().is_empty()) {
        s.push_str(&format!("        {line}\n"));
    }
    s.push_str("    </style>\n");
    s.push_str("</head>\n");
    s.push_str("<body>\n");
    s
}

fn item_text_html(item: &TodoItem) -> String {
    format!("<div class=\"itemtext\">\n{}\n</div>\n", html_text(&item.text))
}

fn source_link_html(item: &TodoItem) -> String {
    let source = display(&item.source);
    format!(
        "<p class=\"flink\"><a href=\"#{}\">{}</a></p>\n",
        escape(&as_link_name(&source)),
        escape(&source)
    )
}

fn contents_section(files: &[&TodoFile], any_flags: bool, any_tags: bool) -> String {
    let mut s = String::new();
    s.push_str("<div id=\"contents_section\">\n");
    s.push_str("<h2>Contents</h2>\n");
    s.push_str("<h3>Sections</h3>\n");
    s.push_str("<ul>\n");
    if any_flags {
        s.push_str("<li><a href=\"#flagged_section\">Flagged Items</a></li>\n");
    }
    if any_tags {
        s.push_str("<li><a href=\"#tags_section\">Tagged Items</a></li>\n");
    }
    s.push_str("<li><a href=\"#main\">Files with To-do Items</a></li>\n");
    s.push_str("</ul>\n");

    s.push_str("<h3>Files</h3>\n");
    s.push_str("<ul>\n");
    for file in files {
        let name = display(&file.path);
        s.push_str(&format!(
            "<li class=\"flink\"><a href=\"#{}\">{}</a></li>\n",
            escape(&as_link_name(&name)),
            escape(&name)
        ));
    }
    s.push_str("</ul>\n");
    s.push_str("</div>  <!--end contents_section -->\n");
    s
}

fn flagged_section(items: &[&TodoItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut s = String::new();
    s.push_str("<div id=\"flagged_section\">\n");
    s.push_str("<h2><a>Flagged Items</a></h2>\n");
    s.push_str("<div id=\"flagged_items\">\n");
    for (row, item) in items.iter().enumerate() {
        s.push_str(&format!("<div class=\"flag{}\">\n", (row + 1) % 2));
        s.push_str(&source_link_html(item));
        s.push_str(&item_text_html(item));
        s.push_str("</div>\n");
    }
    s.push_str("</div>  <!--end flagged_items -->\n");
    s.push_str("</div>  <!--end flagged_section -->\n");
    s
}

fn tags_section(tags: &TagIndex<'_>) -> String {
    if tags.is_empty() {
        return String::new();
    }

    let mut s = String::new();
    s.push_str("<div id=\"tags_section\">\n");
    s.push_str("<h2><a>Tagged Items</a></h2>\n");
    s.push_str("<div id=\"tagged_items\">\n");
    for (tag, items) in tags.iter() {
        s.push_str("<div class=\"tagheader\">\n");
        s.push_str(&format!("<p>Tag: <strong>{}</strong></p>\n", escape(tag)));
        s.push_str("</div>\n");
        for (row, item) in items.iter().enumerate() {
            s.push_str(&format!("<div class=\"tag{}\">\n", (row + 1) % 2));
            s.push_str(&source_link_html(item));
            s.push_str(&item_text_html(item));
            s.push_str("</div>\n");
        }
    }
    s.push_str("</div>  <!--end tagged_items -->\n");
    s.push_str("</div>  <!--end tags_section -->\n");
    s
}

fn main_section(files: &[&TodoFile]) -> String {
    let mut s = String::new();
    s.push_str("<div id=\"main\">\n");
    s.push_str("<h2><a>Files with To-do Items</a></h2>\n");
    for file in files {
        let name = display(&file.path);
        s.push_str(&format!(
            "<div class=\"fileheader\" id=\"{}\">\n",
            escape(&as_link_name(&name))
        ));
        s.push_str(&format!("  <p class=\"filename\"><a>{}</a></p>\n", escape(&name)));
        s.push_str(&format!("  <p class=\"filetime\">Modified {}</p>\n", file.modified));
        s.push_str("</div>\n");

        s.push_str("<div class=\"filecontent\">\n");
        for (row, item) in file.items.iter().enumerate() {
            let bold = if item.is_flagged || item.is_elevated { " flagged" } else { "" };
            s.push_str(&format!("<div class=\"item{}{}\">\n", (row + 1) % 2, bold));
            s.push_str(&item_text_html(item));
            s.push_str("</div>\n\n");
        }
        s.push_str("<p class=\"toplink\">(<a href=\"#contents_section\">top</a>)</p>\n");
        s.push_str("</div>  <!--end filecontent -->\n\n");
    }
    s.push_str("</div>  <!--end main -->\n");
    s
}

fn settings_section(roots: &[ScanRoot], excluded: &[PathBuf], sort: SortOrder) -> String {
    let mut s = String::new();
    s.push_str("<div id=\"settings_section\">\n");

    s.push_str("<p>Directories scanned:<br>\n");
    for root in roots {
        s.push_str(&format!(
            "&nbsp;&nbsp;{}&nbsp;&nbsp;&nbsp;(recurse={})<br>\n",
            escape(&display(&root.path)),
            root.recurse
        ));
    }
    s.push_str("</p>\n");

    if !excluded.is_empty() {
        s.push_str("<p>Directories excluded:<br>\n");
        for dir in excluded {
            s.push_str(&format!("&nbsp;&nbsp;{}<br>\n", escape(&display(dir))));
        }
        s.push_str("</p>\n");
    }

    if sort == SortOrder::ModifiedDesc {
        s.push_str("<p>Sorted by file-modified time, most recent first.</p>\n");
    }

    s.push_str("</div>  <!--end settings_section -->\n");
    s
}

/// Render the report as a complete HTML document.
pub fn render_html(report: &Report, title: &str, run_time: &DateTime<Local>) -> String {
    let files: Vec<&TodoFile> = report.files_with_items().collect();
    let flagged = report.flagged();
    let tags = report.tags();

    let mut output = String::with_capacity(16384);
    output.push_str(&html_head(title));
    output.push('\n');
    output.push_str("<div id=\"wrapper\">\n");
    output.push_str("<div id=\"content\">\n");
    output.push_str(&format!("<h1>{}</h1>\n", escape(title)));

    output.push_str(&contents_section(&files, !flagged.is_empty(), !tags.is_empty()));
    output.push('\n');
    output.push_str(&flagged_section(&flagged));
    output.push('\n');
    output.push_str(&tags_section(&tags));
    output.push('\n');
    output.push_str(&main_section(&files));
    output.push('\n');
    output.push_str(&settings_section(&report.roots, &report.excluded, report.sort));
    output.push('\n');

    output.push_str("<div id=\"footer\">\n");
    output.push_str(&created_line(run_time));
    output.push_str("</div>\n\n");
    output.push_str("</div>  <!--end content -->\n");
    output.push_str("</div>  <!--end wrapper -->\n");
    output.push_str("</body>\n");
    output.push_str("</html>\n");
    output
}

// ============================================================================
// Text
// ============================================================================

/// Render the report as plain text.
pub fn render_text(report: &Report, run_time: &DateTime<Local>) -> String {
    let sep = "-".repeat(TEXT_SEPARATOR_WIDTH);
    let mut output = String::from("Gathered ToDo Items\n");

    for file in report.files_with_items() {
        output.push_str(&sep);
        output.push('\n');
        output.push_str(&format!("{}\n", file.path.display()));
        output.push_str(&format!("  ({})\n\n", file.modified));
        for item in &file.items {
            output.push_str(&item.text);
            output.push('\n');
        }
        output.push('\n');
    }

    output.push_str(&sep);
    output.push('\n');
    output.push_str(&created_line(run_time));
    output
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    created: String,
    generator: String,
    files: Vec<&'a TodoFile>,
    flagged: Vec<&'a TodoItem>,
    tags: BTreeMap<&'a str, Vec<JsonTagged<'a>>>,
    settings: JsonSettings<'a>,
    diagnostics: &'a Diagnostics,
}

#[derive(Serialize)]
struct JsonTagged<'a> {
    text: &'a str,
    #[serde(serialize_with = "serialize_path_lossy")]
    source: &'a Path,
}

#[derive(Serialize)]
struct JsonSettings<'a> {
    roots: &'a [ScanRoot],
    excluded: Vec<Cow<'a, str>>,
    sort: SortOrder,
}

/// Render the report as pretty-printed JSON.
pub fn render_json(report: &Report, title: &str, run_time: &DateTime<Local>) -> Result<String, OutputError> {
    let index = report.tags();
    let tags: BTreeMap<&str, Vec<JsonTagged<'_>>> = index
        .iter()
        .map(|(tag, items)| {
            let tagged: Vec<JsonTagged<'_>> = items
                .iter()
                .map(|item| JsonTagged {
                    text: &item.text,
                    source: &item.source,
                })
                .collect();
            (tag, tagged)
        })
        .collect();

    let output = JsonReport {
        title,
        created: run_time.format(CREATED_FORMAT).to_string(),
        generator: app_title(),
        files: report.files_with_items().collect(),
        flagged: report.flagged(),
        tags,
        settings: JsonSettings {
            roots: &report.roots,
            excluded: report.excluded.iter().map(|p| p.to_string_lossy()).collect(),
            sort: report.sort,
        },
        diagnostics: &report.diagnostics,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

// ============================================================================
// Files
// ============================================================================

/// Work out an output file name from a base name.
///
/// The base is made absolute, the run time is appended to the stem when
/// given, and `suffix` replaces any other extension. A warning is logged
/// when the resulting name would itself be picked up by a later scan.
pub fn output_path(
    base: &Path,
    run_time: Option<&DateTime<Local>>,
    suffix: &str,
    specs: &FileSpecs,
) -> PathBuf {
    let mut path = resolve_path(base);

    if let Some(run_time) = run_time {
        let mut stamped = path.with_extension("").into_os_string();
        stamped.push(format!("_{}", run_time.format(FILE_DATE_FORMAT)));
        path = PathBuf::from(stamped);
    }

    let extension = suffix.trim_start_matches('.');
    let keep = path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
    if !keep {
        path.set_extension(extension);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // Bad specs were already reported by the scan.
    let mut scratch = Diagnostics::new();
    if specs.matches(&name, &mut scratch) {
        tracing::warn!(
            "Output file name matches a specification for files to be scanned. \
             Its contents will be included in subsequent scans, causing duplication. \
             NAME: {}",
            path.display()
        );
    }

    path
}

/// Write one output file.
pub fn write_file(path: &Path, content: &str) -> Result<(), OutputError> {
    tracing::info!("Writing file [{}]", path.display());
    fs::write(path, content).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Paths of the files written by [`write_reports`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Written {
    pub html: Option<PathBuf>,
    pub text: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// Write every output the options ask for.
pub fn write_reports(
    report: &Report,
    options: &AppOptions,
    run_time: &DateTime<Local>,
) -> Result<Written, OutputError> {
    let specs = options.file_specs();
    let mut written = Written::default();

    if !options.no_html {
        let path = output_path(&options.output_file, None, ".html", &specs);
        write_file(&path, &render_html(report, &options.page_title, run_time))?;
        written.html = Some(path);
    }

    if options.do_text || options.do_text_dt {
        let stamp = options.do_text_dt.then_some(run_time);
        let path = output_path(&options.output_file, stamp, ".txt", &specs);
        write_file(&path, &render_text(report, run_time))?;
        written.text = Some(path);
    }

    if options.do_json {
        let path = output_path(&options.output_file, None, ".json", &specs);
        write_file(&path, &render_json(report, &options.page_title, run_time)?)?;
        written.json = Some(path);
    }

    Ok(written)
}
