//! orderpull core library: domain types, startup errors, ID source,
//! credentials and run configuration.
//!
//! - [`types`]: [`OrderId`], [`FetchOutcome`], [`FailureKind`]
//! - [`error`]: [`StartupError`]
//! - [`ids`]: lazy CSV ID reader
//! - [`credentials`]: token / cookie resolution
//! - [`config`]: [`FetchConfig`]
//! - [`stats`]: [`RunStatistics`]

pub mod config;
pub mod credentials;
pub mod error;
pub mod ids;
pub mod stats;
pub mod types;

pub use config::FetchConfig;
pub use credentials::Credentials;
pub use error::StartupError;
pub use ids::{read_order_ids, ColumnSelector, OrderIdReader};
pub use stats::RunStatistics;
pub use types::{FailureKind, FetchOutcome, ItemResult, OrderId};
