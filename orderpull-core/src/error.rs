//! Error types for orderpull-core.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions detected before any network activity begins.
///
/// Per-order failures are never represented here; see
/// [`crate::FetchOutcome`] and [`crate::FailureKind`].
#[derive(Debug, Error)]
pub enum StartupError {
    /// Neither the bearer token nor the session cookie is set.
    #[error("no credentials: set {token_var} or {cookie_var} (environment or .env)")]
    MissingCredentials {
        token_var: &'static str,
        cookie_var: &'static str,
    },

    /// The ID input file does not exist.
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The header row does not contain the configured ID column.
    #[error("column '{column}' not found in header of {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// Malformed delimited input.
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is out of range or unparseable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience constructor for [`StartupError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StartupError {
    StartupError::Io {
        path: path.into(),
        source,
    }
}
