//! Run configuration, built once at startup and passed down explicitly.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StartupError;
use crate::ids::ColumnSelector;

/// GraphQL endpoint of the Atlas order-management API.
pub const DEFAULT_API_URL: &str = "https://atlas-server.urbanpiper.com/graphql";
/// Dashboard origin the API expects requests to come from.
pub const DEFAULT_ORIGIN: &str = "https://atlas.urbanpiper.com";
pub const DEFAULT_OUTPUT_DIR: &str = "orders";
pub const DEFAULT_INPUT_FILE: &str = "Order-transactions-32646829-2025-07-29.csv";
pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a batch run needs apart from credentials and the ID list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub api_url: String,
    pub origin: String,
    pub output_dir: PathBuf,
    /// Upper bound on simultaneous in-flight requests.
    pub workers: NonZeroUsize,
    /// Pause each worker takes after a request completes.
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub id_column: ColumnSelector,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            workers: NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN),
            request_delay: DEFAULT_REQUEST_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            id_column: ColumnSelector::default(),
        }
    }
}

impl FetchConfig {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), StartupError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(StartupError::InvalidConfig(format!(
                "api url must be http(s), got '{}'",
                self.api_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(StartupError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(StartupError::InvalidConfig(
                "output directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.workers.get(), 5);
        assert_eq!(cfg.output_dir, PathBuf::from("orders"));
        assert_eq!(cfg.request_delay, Duration::from_millis(100));
        assert_eq!(cfg.id_column, ColumnSelector::Name("ID".to_string()));
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn rejects_non_http_url() {
        let cfg = FetchConfig {
            api_url: "ftp://example.com".to_string(),
            ..FetchConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(StartupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let cfg = FetchConfig {
            request_timeout: Duration::ZERO,
            ..FetchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
