//! File name filtering.
//!
//! A file qualifies for scanning when its name satisfies at least one
//! [`MatchSpec`]. Specs are tried in declaration order and the first hit
//! wins. A spec that does not compile is reported once through
//! [`Diagnostics`] and otherwise behaves as a non-match.
//!
//! Regex specs use the `regex` crate syntax, which has no lookaround or
//! backreferences. Specs such as `^todo(?!-old)` are reported as bad specs.

use std::fmt;

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};

use crate::errors::Diagnostics;

/// Built-in name patterns for common note and to-do file names.
pub const DEFAULT_FILE_SPECS: &[&str] = &[
    r"^notes.*\.md$",
    r"^notes.*\.txt$",
    r".*notes\.md$",
    r".*notes\.txt$",
    r"^todo.*\.md$",
    r"^todo.*\.txt$",
    r".*-todo\.md$",
    r".*-todo\.txt$",
    r"^context-.*\.md$",
    r"^context-.*\.txt$",
];

/// A single file name specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSpec {
    /// Regular expression searched anywhere in the lower-cased file name.
    Regex(String),
    /// Shell-style wildcard (`*.md`) matched against the whole file name.
    Wildcard(String),
}

impl MatchSpec {
    pub fn as_str(&self) -> &str {
        match self {
            MatchSpec::Regex(s) | MatchSpec::Wildcard(s) => s,
        }
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum Compiled {
    Regex(Regex),
    Wildcard(Pattern),
    Invalid(String),
}

const WILDCARD_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// An ordered, pre-compiled set of match specs.
#[derive(Debug, Clone)]
pub struct FileSpecs {
    specs: Vec<(MatchSpec, Compiled)>,
}

impl FileSpecs {
    /// Compile the given specs, keeping their order.
    pub fn new(specs: impl IntoIterator<Item = MatchSpec>) -> Self {
        let specs = specs
            .into_iter()
            .map(|spec| {
                let compiled = compile(&spec);
                (spec, compiled)
            })
            .collect();
        Self { specs }
    }

    /// The built-in [`DEFAULT_FILE_SPECS`].
    pub fn defaults() -> Self {
        Self::new(
            DEFAULT_FILE_SPECS
                .iter()
                .map(|s| MatchSpec::Regex((*s).to_string())),
        )
    }

    pub fn specs(&self) -> impl Iterator<Item = &MatchSpec> {
        self.specs.iter().map(|(spec, _)| spec)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Check a file name against the specs.
    ///
    /// Returns `true` on the first spec that matches. Invalid specs reached
    /// before that point add a `ERROR bad match spec ...` message to
    /// `diagnostics` (once per distinct message).
    pub fn matches(&self, file_name: &str, diagnostics: &mut Diagnostics) -> bool {
        let name = file_name.to_lowercase();

        for (spec, compiled) in &self.specs {
            let hit = match compiled {
                Compiled::Regex(re) => re.is_match(&name),
                Compiled::Wildcard(pattern) => pattern.matches_with(&name, WILDCARD_OPTIONS),
                Compiled::Invalid(detail) => {
                    diagnostics.record(format!(
                        "ERROR bad match spec '{spec}'. Error message: '{detail}'"
                    ));
                    false
                }
            };
            if hit {
                tracing::debug!("'{file_name}' matched spec '{spec}'");
                return true;
            }
        }

        false
    }
}

impl Default for FileSpecs {
    fn default() -> Self {
        Self::defaults()
    }
}

fn compile(spec: &MatchSpec) -> Compiled {
    match spec {
        MatchSpec::Regex(s) => match RegexBuilder::new(s).case_insensitive(true).build() {
            Ok(re) => Compiled::Regex(re),
            Err(e) => Compiled::Invalid(one_line(&e.to_string())),
        },
        MatchSpec::Wildcard(s) => match Pattern::new(s) {
            Ok(pattern) => Compiled::Wildcard(pattern),
            Err(e) => Compiled::Invalid(e.to_string()),
        },
    }
}

// Regex syntax errors span several lines with a caret diagram.
fn one_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convenience wrapper: compile `specs` and test a single file name.
pub fn matches_filespec(file_name: &str, specs: &[MatchSpec], diagnostics: &mut Diagnostics) -> bool {
    FileSpecs::new(specs.iter().cloned()).matches(file_name, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex_specs(specs: &[&str]) -> Vec<MatchSpec> {
        specs.iter().map(|s| MatchSpec::Regex((*s).to_string())).collect()
    }

    #[test]
    fn test_default_specs() {
        let specs = FileSpecs::defaults();
        let mut diagnostics = Diagnostics::new();

        let included = [
            "notes.txt",
            "notes.md",
            "Notes-UC.txt",
            "somenotes.txt",
            "thisis-todo.txt",
            "todo-lc.txt",
            "ToDo-UC.txt",
            "todo.txt",
            "todo.md",
            "Context-work.txt",
        ];
        for name in included {
            assert!(specs.matches(name, &mut diagnostics), "{name} should match");
        }

        let excluded = ["notthis.txt", "thisis-notodo.txt", "wonotest.txt", "readme.md"];
        for name in excluded {
            assert!(!specs.matches(name, &mut diagnostics), "{name} should not match");
        }

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_regex_is_substring_search() {
        let mut diagnostics = Diagnostics::new();
        let specs = regex_specs(&["quack"]);
        assert!(matches_filespec("dr-quack.md", &specs, &mut diagnostics));
        assert!(matches_filespec("DR-QUACK.MD", &specs, &mut diagnostics));
        assert!(!matches_filespec("duck.md", &specs, &mut diagnostics));
    }

    #[test]
    fn test_bad_spec_reported_once() {
        let specs = FileSpecs::new(regex_specs(&["*.md$", r".*\.md"]));
        let mut diagnostics = Diagnostics::new();

        assert!(specs.matches("notes.md", &mut diagnostics));
        assert!(specs.matches("other.md", &mut diagnostics));
        assert!(!specs.matches("other.txt", &mut diagnostics));

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.messages()[0].starts_with("ERROR bad match spec '*.md$'. Error message: '"));
        assert!(!diagnostics.messages()[0].contains('\n'));
    }

    #[test]
    fn test_lookaround_is_a_bad_spec() {
        let specs = FileSpecs::new(regex_specs(&[r"^todo(?!-old)", r"(\w)\1\.txt"]));
        let mut diagnostics = Diagnostics::new();

        assert!(!specs.matches("todo.txt", &mut diagnostics));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.messages()[0].starts_with("ERROR bad match spec '^todo(?!-old)'"));
    }

    #[test]
    fn test_all_specs_invalid_is_no_match() {
        let specs = FileSpecs::new(regex_specs(&["(", "[z-a]"]));
        let mut diagnostics = Diagnostics::new();
        assert!(!specs.matches("todo.txt", &mut diagnostics));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_first_match_short_circuits() {
        let specs = FileSpecs::new(regex_specs(&["^todo", "("]));
        let mut diagnostics = Diagnostics::new();
        assert!(specs.matches("todo.txt", &mut diagnostics));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_wildcard_spec() {
        let specs = FileSpecs::new([MatchSpec::Wildcard("*.md".to_string())]);
        let mut diagnostics = Diagnostics::new();
        assert!(specs.matches("dr-quack.md", &mut diagnostics));
        assert!(specs.matches("Dr-Quack.MD", &mut diagnostics));
        assert!(!specs.matches("dr-quack.md.bak", &mut diagnostics));
    }

    #[test]
    fn test_empty_specs_match_nothing() {
        let specs = FileSpecs::new(Vec::new());
        let mut diagnostics = Diagnostics::new();
        assert!(specs.is_empty());
        assert!(!specs.matches("todo.txt", &mut diagnostics));
    }
}
