//! Aggregate counters for one batch run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{FailureKind, ItemResult};

/// Counters accumulated across a run and reported at the end.
///
/// `skipped + succeeded + failed()` always equals `distinct()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    /// IDs read from the input, duplicates included.
    pub total: usize,
    /// Repeated IDs dropped before dispatch.
    pub duplicates: usize,
    /// Artifact already present; not fetched.
    pub skipped: usize,
    pub succeeded: usize,
    pub not_found: usize,
    pub auth_failed: usize,
    pub transient_failed: usize,
    pub other_failed: usize,
    pub write_failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStatistics {
    pub fn new(total: usize, duplicates: usize) -> Self {
        Self {
            total,
            duplicates,
            skipped: 0,
            succeeded: 0,
            not_found: 0,
            auth_failed: 0,
            transient_failed: 0,
            other_failed: 0,
            write_failed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, result: &ItemResult) {
        match result {
            ItemResult::Skipped => self.skipped += 1,
            ItemResult::Succeeded => self.succeeded += 1,
            ItemResult::Failed(kind) => *self.failure_slot(*kind) += 1,
        }
    }

    fn failure_slot(&mut self, kind: FailureKind) -> &mut usize {
        match kind {
            FailureKind::NotFound => &mut self.not_found,
            FailureKind::Auth => &mut self.auth_failed,
            FailureKind::Transient => &mut self.transient_failed,
            FailureKind::Other => &mut self.other_failed,
            FailureKind::WriteFailed => &mut self.write_failed,
        }
    }

    pub fn failed(&self) -> usize {
        self.not_found + self.auth_failed + self.transient_failed + self.other_failed + self.write_failed
    }

    /// Distinct IDs presented to the orchestrator.
    pub fn distinct(&self) -> usize {
        self.total - self.duplicates
    }

    /// Number of IDs that have been accounted for so far.
    pub fn processed(&self) -> usize {
        self.skipped + self.succeeded + self.failed()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock run time, once finished.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    /// Non-zero failure counters, in reporting order.
    pub fn failure_breakdown(&self) -> Vec<(FailureKind, usize)> {
        [
            (FailureKind::NotFound, self.not_found),
            (FailureKind::Auth, self.auth_failed),
            (FailureKind::Transient, self.transient_failed),
            (FailureKind::Other, self.other_failed),
            (FailureKind::WriteFailed, self.write_failed),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .collect()
    }
}
