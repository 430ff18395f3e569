//! Error types for todolister.
//!
//! Fatal problems are [`TodoListerError`] values that end the run.
//! Recoverable problems are collected in [`Diagnostics`] and reported
//! at the end without changing the exit status.

use std::path::PathBuf;

use serde::Serialize;

use crate::extract::ExtractError;
use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for todolister operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoListerError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Options file not found: {0}")]
    OptionsFileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Map an error to its exit code.
pub fn exit_code(error: &TodoListerError) -> i32 {
    match error {
        TodoListerError::PathNotFound(_) => 3,
        TodoListerError::OptionsFileNotFound(_) => 3,
        TodoListerError::Io(_) => 1,
        TodoListerError::Walk(_) => 2,
        TodoListerError::Extract(_) => 1,
        TodoListerError::Output(_) => 1,
    }
}

/// Ordered, de-duplicated list of recoverable error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, logging it the first time it is seen.
    ///
    /// Returns `false` when the same message was already recorded.
    pub fn record(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.messages.contains(&message) {
            return false;
        }
        tracing::error!("{message}");
        self.messages.push(message);
        true
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_dedups_by_message() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.record("ERROR one"));
        assert!(diagnostics.record("ERROR two"));
        assert!(!diagnostics.record("ERROR one"));

        assert_eq!(diagnostics.messages(), ["ERROR one", "ERROR two"]);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&TodoListerError::PathNotFound("/x".into())), 3);
        assert_eq!(
            exit_code(&TodoListerError::OptionsFileNotFound("/x.opt".into())),
            3
        );
        let io = std::io::Error::other("boom");
        assert_eq!(exit_code(&TodoListerError::Io(io)), 1);
    }
}
