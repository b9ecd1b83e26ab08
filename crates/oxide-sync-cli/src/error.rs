//! Error types for the command-line tool.

use std::path::PathBuf;

use oxide_sync_rules::SyncRulesError;

/// Errors that can occur while loading or compiling rules.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Neither `--sql` nor `--file` was given.
    #[error("No query given: pass --sql or --file")]
    MissingQuery,

    /// The rule file could not be read.
    #[error("Failed to read rule file '{path}': {source}")]
    ReadFile {
        /// Path to the rule file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// `--parameters` is not a JSON object of session parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] serde_json::Error),

    /// The rule failed to parse or combine.
    #[error(transparent)]
    Rules(#[from] SyncRulesError),

    /// The rule compiled with diagnostics.
    #[error("Query has {0} error(s)")]
    Diagnostics(usize),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
