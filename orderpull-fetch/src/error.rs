//! Error types for orderpull-fetch.

use thiserror::Error;

use orderpull_core::StartupError;

/// Failures constructing a client. Request-time failures are never errors;
/// they are classified into [`orderpull_core::FetchOutcome`] instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] StartupError),

    /// A credential or configured header contains characters that cannot
    /// appear in an HTTP header value.
    #[error("invalid value for header '{name}'")]
    InvalidHeader { name: &'static str },
}
