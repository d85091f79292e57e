//! Resume status: how much of an input list already has artifacts.
//!
//! Read-only; no credentials or network needed.

use serde::Serialize;

use orderpull_core::OrderId;

use crate::orchestrator::dedup_preserving_order;
use crate::writer::OrderSink;
use crate::SinkError;

/// Progress of an input list against an output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeStatus {
    /// IDs in the input, duplicates included.
    pub total: usize,
    pub distinct: usize,
    pub fetched: usize,
    /// Distinct IDs without an artifact, in input order.
    pub pending: Vec<OrderId>,
    /// Artifacts in the directory that the input does not mention.
    pub extra: usize,
}

impl ResumeStatus {
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Compare `ids` with the artifacts currently in `sink`.
pub fn scan(ids: Vec<OrderId>, sink: &OrderSink) -> Result<ResumeStatus, SinkError> {
    let mut existing = sink.list_artifacts()?;
    let total = ids.len();
    let ids = dedup_preserving_order(ids);
    let distinct = ids.len();

    let mut pending = Vec::new();
    let mut fetched = 0;
    for id in ids {
        if existing.remove(&id) {
            fetched += 1;
        } else {
            pending.push(id);
        }
    }

    Ok(ResumeStatus {
        total,
        distinct,
        fetched,
        pending,
        extra: existing.len(),
    })
}
