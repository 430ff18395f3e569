//! Options file grammar.
//!
//! ```text
//! # comment
//! [output]
//! filename="~/Documents/tasks"
//! by_modified_time_desc=Yes
//!
//! [folders]
//! "~/Projects"+
//! ```
//!
//! A line equal to a section header (after trimming) opens that section.
//! A blank line closes it, as does any line starting with `[` (which is
//! then checked as a header itself). Lines starting with `#` are comments.
//! Every other line inside a section is an entry. Entries for a header
//! accumulate across repeated occurrences of that header.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

pub const SECTION_OUTPUT: &str = "[output]";
pub const SECTION_MATCH: &str = "[match]";
pub const SECTION_FOLDERS: &str = "[folders]";
pub const SECTION_EXCLUDE: &str = "[exclude]";

/// Value that defers a switch to an interactive question.
pub const ASK: &str = "ask";

const QUOTES: &[char] = &['\'', '"'];

/// Parsed options file: section header to ordered entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsFile {
    sections: HashMap<String, Vec<String>>,
}

impl OptionsFile {
    /// An options file with no sections.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse options file content in one pass.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sections: HashMap<String, Vec<String>> = HashMap::new();
        // Header of the open section, if any.
        let mut current: Option<String> = None;

        for line in lines {
            let s = line.as_ref().trim();

            if s.is_empty() {
                current = None;
                continue;
            }

            if current.is_some() && s.starts_with('[') {
                current = None;
            } else if let Some(header) = &current {
                if !s.starts_with('#') {
                    sections
                        .entry(header.clone())
                        .or_default()
                        .push(s.to_string());
                }
            }

            if current.is_none() && s.starts_with('[') {
                sections.entry(s.to_string()).or_default();
                current = Some(s.to_string());
            }
        }

        Self { sections }
    }

    /// Parse options file text.
    pub fn from_text(text: &str) -> Self {
        Self::parse(text.lines())
    }

    /// Entries of a section, in file order. Empty if the section is absent.
    pub fn entries(&self, header: &str) -> &[String] {
        self.sections.get(header).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First `name=value` entry in a section, with quotes stripped from the value.
    ///
    /// Entries whose key is not exactly `name` (ignoring surrounding
    /// whitespace) or that have no `=` are skipped. Keys are not matched
    /// by prefix, so `do_text_file` never reads a `do_text_file_dt` entry.
    pub fn value(&self, header: &str, name: &str) -> Option<String> {
        self.entries(header).iter().find_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            (key.trim() == name).then(|| strip_quotes(value.trim()).to_string())
        })
    }

    /// Entries of a list section with quotes and outer spaces stripped.
    pub fn list(&self, header: &str) -> Vec<String> {
        self.entries(header)
            .iter()
            .map(|entry| strip_quotes(entry).to_string())
            .filter(|entry| !entry.is_empty())
            .collect()
    }

    /// `[folders]` entries as `(path, recurse)` pairs.
    ///
    /// A trailing `+` outside the quotes marks the folder for recursive scan.
    pub fn folders(&self) -> Vec<(String, bool)> {
        self.entries(SECTION_FOLDERS)
            .iter()
            .filter_map(|entry| {
                let entry = entry.trim();
                let recurse = entry.ends_with('+');
                let path = if recurse { entry.trim_matches('+') } else { entry };
                let path = strip_quotes(path);
                (!path.is_empty()).then(|| (path.to_string(), recurse))
            })
            .collect()
    }

    /// Look up a switch and coerce it to a bool.
    ///
    /// Returns `Ok(None)` when the key is absent. A value of `ask` is
    /// replaced by the answer to `question`.
    pub fn switch(
        &self,
        name: &str,
        question: &str,
        prompt: &mut dyn Prompt,
    ) -> io::Result<Option<bool>> {
        match self.value(SECTION_OUTPUT, name) {
            Some(value) => is_truthy(&value, question, prompt).map(Some),
            None => Ok(None),
        }
    }
}

/// Strip quote characters and spaces from both ends.
///
/// Unbalanced quotes are stripped the same way; nothing is validated.
pub fn strip_quotes(value: &str) -> &str {
    value.trim_matches(|c: char| c == ' ' || QUOTES.contains(&c))
}

/// Coerce an options value to a bool.
///
/// True when the first character is `t`, `y` or `1` (case-insensitive),
/// so `True`, `Yes`, `1` and even `turtle` are true.
pub fn parse_bool(value: &str) -> bool {
    value
        .trim()
        .chars()
        .next()
        .is_some_and(|c| matches!(c.to_ascii_lowercase(), 't' | 'y' | '1'))
}

/// Coerce an options value, asking interactively when the value is `ask`.
pub fn is_truthy(value: &str, question: &str, prompt: &mut dyn Prompt) -> io::Result<bool> {
    if value.trim().eq_ignore_ascii_case(ASK) {
        let answer = prompt.ask(question)?;
        return Ok(parse_bool(&answer));
    }
    Ok(parse_bool(value))
}

/// Source of answers for `ask` switches.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Asks on stdout and reads one line from stdin.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        writeln!(stdout, "\n(Input requested per options file.)")?;
        write!(stdout, "{question} ")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        writeln!(stdout)?;
        Ok(answer.trim().to_string())
    }
}

/// Answers every question with the same fixed reply.
#[derive(Debug, Clone)]
pub struct FixedPrompt(pub String);

impl Prompt for FixedPrompt {
    fn ask(&mut self, _question: &str) -> io::Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# todolister.opt for test.

[output]
filename="/home/me/Documents/project-tasks"
by_modified_time_desc=False
do_text_file=Yes
do_text_file_dt=No
no_html=n
title="Projects To-Do"

#  True/False, Yes/No, y/n, and 1/0 all work for switch settings.


[match]
"^notes.*.txt$"
# a comment inside the section
'.*-todo.txt$'

[folders]
"/home/me/Projects"+
/home/me/Other

[exclude]
"/home/me/Projects/Hold
"#;

    #[test]
    fn test_sections_and_entries() {
        let opts = OptionsFile::from_text(SAMPLE);

        assert_eq!(
            opts.entries(SECTION_MATCH),
            [r#""^notes.*.txt$""#, "'.*-todo.txt$'"]
        );
        assert_eq!(opts.entries(SECTION_OUTPUT).len(), 6);
        assert!(opts.entries("[missing]").is_empty());
    }

    #[test]
    fn test_value_lookup() {
        let opts = OptionsFile::from_text(SAMPLE);

        assert_eq!(
            opts.value(SECTION_OUTPUT, "filename").as_deref(),
            Some("/home/me/Documents/project-tasks")
        );
        assert_eq!(opts.value(SECTION_OUTPUT, "title").as_deref(), Some("Projects To-Do"));
        assert_eq!(opts.value(SECTION_OUTPUT, "do_text_file").as_deref(), Some("Yes"));
        assert_eq!(opts.value(SECTION_OUTPUT, "do_text_file_dt").as_deref(), Some("No"));
        assert_eq!(opts.value(SECTION_OUTPUT, "missing"), None);
    }

    #[test]
    fn test_value_requires_equals() {
        let opts = OptionsFile::from_text("[output]\ntitle\ntitle = 'Later'\n");
        assert_eq!(opts.value(SECTION_OUTPUT, "title").as_deref(), Some("Later"));
    }

    #[test]
    fn test_value_key_is_not_a_prefix() {
        let opts = OptionsFile::from_text("[output]\ndo_text_file_dt=Yes\ndo_text_file =No\n");
        assert_eq!(opts.value(SECTION_OUTPUT, "do_text_file").as_deref(), Some("No"));
        assert_eq!(opts.value(SECTION_OUTPUT, "do_text_file_dt").as_deref(), Some("Yes"));
        assert_eq!(opts.value(SECTION_OUTPUT, "do_text"), None);
    }

    #[test]
    fn test_new_section_without_blank_line() {
        let opts = OptionsFile::from_text("[match]\n\"a\"\n[folders]\n\"/x\"+\n[match]\n\"b\"\n");

        assert_eq!(opts.list(SECTION_MATCH), ["a", "b"]);
        assert_eq!(opts.folders(), [("/x".to_string(), true)]);
    }

    #[test]
    fn test_blank_line_closes_section() {
        let opts = OptionsFile::from_text("[match]\n\"a\"\n\n\"orphan\"\n");
        assert_eq!(opts.list(SECTION_MATCH), ["a"]);
    }

    #[test]
    fn test_lines_before_any_section_ignored() {
        let opts = OptionsFile::from_text("stray=1\n[output]\ntitle=T\n");
        assert_eq!(opts.entries(SECTION_OUTPUT), ["title=T"]);
    }

    #[test]
    fn test_folders_recurse_flag() {
        let opts = OptionsFile::from_text(SAMPLE);
        assert_eq!(
            opts.folders(),
            [
                ("/home/me/Projects".to_string(), true),
                ("/home/me/Other".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_unbalanced_quotes_are_stripped() {
        let opts = OptionsFile::from_text(SAMPLE);
        assert_eq!(opts.list(SECTION_EXCLUDE), ["/home/me/Projects/Hold"]);
        assert_eq!(strip_quotes("'odd\""), "odd");
        assert_eq!(strip_quotes(""), "");
    }

    #[test]
    fn test_parse_bool() {
        for value in ["True", "Yes", "Y", "1", "turtle", "y", "t"] {
            assert!(parse_bool(value), "{value} should be true");
        }
        for value in ["False", "No", "n", "0", "", "  "] {
            assert!(!parse_bool(value), "{value:?} should be false");
        }
    }

    #[test]
    fn test_ask_uses_prompt() {
        let mut yes = FixedPrompt("y".to_string());
        let mut no = FixedPrompt(String::new());

        assert!(is_truthy("ASK", "Continue?", &mut yes).unwrap());
        assert!(!is_truthy("ask", "Continue?", &mut no).unwrap());
        assert!(is_truthy("Yes", "unused", &mut no).unwrap());
    }

    #[test]
    fn test_switch() {
        let opts = OptionsFile::from_text("[output]\nno_html=ask\nby_modified_time_desc=0\n");
        let mut prompt = FixedPrompt("yes".to_string());

        assert_eq!(opts.switch("no_html", "Skip?", &mut prompt).unwrap(), Some(true));
        assert_eq!(
            opts.switch("by_modified_time_desc", "Sort?", &mut prompt).unwrap(),
            Some(false)
        );
        assert_eq!(opts.switch("do_text_file", "Text?", &mut prompt).unwrap(), None);
    }
}
