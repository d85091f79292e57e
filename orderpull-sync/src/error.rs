//! Error types for orderpull-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the persistence sink.
///
/// During a batch these are per-item and only counted; they abort nothing
/// except [`crate::OrderSink::prepare`] at startup.
#[derive(Debug, Error)]
pub enum SinkError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The order ID cannot be used as a file name.
    #[error("order id '{id}' is not a safe file name")]
    UnsafeId { id: String },
}

/// Convenience constructor for [`SinkError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.into(),
        source,
    }
}
