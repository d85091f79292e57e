//! Domain types for an order fetch run.
//!
//! An [`OrderId`] is the unit of work; a [`FetchOutcome`] is what one
//! attempt against the remote API produced; [`FailureKind`] is the
//! category a non-success outcome is counted under.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier of one order in the remote order-management system.
///
/// Observed IDs are numeric, but nothing here relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The ID as a JSON-friendly integer, when it is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of exactly one fetch attempt for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 2xx with a parseable JSON body. `body` is the response text, verbatim.
    Success { body: String },
    /// HTTP 404.
    NotFound,
    /// HTTP 401 or 403.
    AuthError { status: u16 },
    /// Network-level failure or 5xx. Worth retrying in a later run.
    Transient { reason: String },
    /// Anything else: unexpected status or a body that is not JSON.
    Other {
        status: Option<u16>,
        snippet: String,
    },
}

impl FetchOutcome {
    /// Failure category, or `None` for [`FetchOutcome::Success`].
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::NotFound => Some(FailureKind::NotFound),
            FetchOutcome::AuthError { .. } => Some(FailureKind::Auth),
            FetchOutcome::Transient { .. } => Some(FailureKind::Transient),
            FetchOutcome::Other { .. } => Some(FailureKind::Other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Per-item failure categories counted in [`crate::RunStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Auth,
    Transient,
    Other,
    /// The fetch succeeded but the artifact could not be written.
    WriteFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::Auth => write!(f, "auth"),
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Other => write!(f, "other"),
            FailureKind::WriteFailed => write!(f, "write_failed"),
        }
    }
}

/// What happened to one ID during a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResult {
    /// Artifact already present; never dispatched.
    Skipped,
    /// Fetched and written.
    Succeeded,
    Failed(FailureKind),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
