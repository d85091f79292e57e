//! # orderpull-fetch
//!
//! Fetch worker for the Atlas order API.
//!
//! [`AtlasClient`] performs exactly one request per call and never fails:
//! every result, including network errors, is returned as a
//! [`orderpull_core::FetchOutcome`]. The [`OrderTransport`] trait is the seam
//! the orchestrator depends on, so tests can substitute their own transport.

pub mod client;
pub mod error;
pub mod query;

pub use client::{classify, classify_read, AtlasClient, OrderTransport};
pub use error::ClientError;
