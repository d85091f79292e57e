//! # orderpull-sync
//!
//! Exclusive-create artifact writer and batch orchestration.
//!
//! Call [`run_batch`] to fetch every order in a list that has no artifact yet,
//! or [`status::scan`] to see how far a list has progressed.

pub mod error;
pub mod orchestrator;
pub mod status;
pub mod writer;

pub use error::SinkError;
pub use orchestrator::{dedup_preserving_order, run_batch, BatchOptions};
pub use status::ResumeStatus;
pub use writer::{OrderSink, PersistResult};
