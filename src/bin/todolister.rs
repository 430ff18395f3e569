//! Todolister CLI - Gather open to-do items from folders of notes.

use std::path::PathBuf;

use chrono::Local;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use todolister::browser;
use todolister::builder::TodoLister;
use todolister::config::{AppOptions, Arguments, DEFAULT_PAGE_TITLE};
use todolister::errors::{exit_code, TodoListerError};
use todolister::options::ConsolePrompt;
use todolister::output::{app_title, write_reports};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todolister")]
#[command(about = "Gather open to-do items from text and Markdown notes into an HTML report")]
#[command(version)]
struct Cli {
    /// Folders to scan. Default: folders in the options file, else the current folder
    folders: Vec<PathBuf>,

    /// Options file with [output], [match], [folders] and [exclude] sections
    #[arg(short = 'f', long)]
    options_file: Option<PathBuf>,

    /// Scan sub-folders of the folders given on the command line
    #[arg(short, long)]
    recurse: bool,

    /// Sort by file-modified time, most recent first
    #[arg(short = 'm', long = "mtime-desc")]
    by_mtime: bool,

    /// Output file name. The extension is replaced per output type
    #[arg(short, long)]
    output_file: Option<PathBuf>,

    /// Also write a text file
    #[arg(short = 't', long)]
    text_file: bool,

    /// Also write a text file with the run date and time in its name
    #[arg(short = 'd', long)]
    text_file_dt: bool,

    /// Also write a JSON file
    #[arg(short = 'j', long)]
    json_file: bool,

    /// Do not write the HTML file
    #[arg(short = 'n', long)]
    no_html: bool,

    /// Folders to skip, separated by semicolons
    #[arg(short = 'x', long)]
    exclude_path: Option<String>,

    /// Additional file name pattern to match, such as '*.md'
    #[arg(short = 'a', long)]
    add_match: Vec<String>,

    /// Title of the HTML page
    #[arg(short = 'p', long, default_value = DEFAULT_PAGE_TITLE)]
    page_title: String,

    /// Do not open the HTML file in a browser
    #[arg(short = 'q', long)]
    no_browser: bool,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Cli {
    fn into_arguments(self) -> Arguments {
        Arguments {
            folders: self.folders,
            options_file: self.options_file,
            recurse: self.recurse,
            by_mtime: self.by_mtime,
            output_file: self.output_file,
            do_text: self.text_file,
            do_text_dt: self.text_file_dt,
            do_json: self.json_file,
            no_html: self.no_html,
            exclude_path: self.exclude_path.unwrap_or_default(),
            add_match: self.add_match,
            page_title: self.page_title,
            no_browser: self.no_browser,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "todolister", &mut std::io::stdout());
        return;
    }

    init_logging(cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), TodoListerError> {
    println!("Running {}.", app_title());
    let run_time = Local::now();

    let options = AppOptions::resolve(cli.into_arguments(), &mut ConsolePrompt)?;
    let report = TodoLister::from_options(&options).scan()?;
    let written = write_reports(&report, &options, &run_time)?;

    if !report.diagnostics.is_empty() {
        println!("\nThere were errors!");
        for message in report.diagnostics.messages() {
            println!("{message}");
        }
        println!();
    }

    if !options.no_browser {
        if let Some(html) = &written.html {
            browser::try_open(html);
        }
    }

    println!("Done ({}).", app_title());
    Ok(())
}
