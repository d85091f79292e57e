//! `orderpull probe`: fetch one order as a connectivity and credentials check.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use orderpull_core::{
    config::{DEFAULT_API_URL, DEFAULT_OUTPUT_DIR, DEFAULT_REQUEST_TIMEOUT},
    Credentials, FetchConfig, FetchOutcome, OrderId,
};
use orderpull_fetch::{AtlasClient, OrderTransport};
use orderpull_sync::{OrderSink, PersistResult};

const PREVIEW_CHARS: usize = 1000;

/// Arguments for `orderpull probe`.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Order to fetch.
    pub order_id: String,

    /// Print the order without writing an artifact.
    #[arg(long)]
    pub no_save: bool,

    /// Directory the artifact is written to.
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// GraphQL endpoint to query.
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout, in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

impl ProbeArgs {
    pub fn run(self) -> Result<()> {
        let credentials = Credentials::from_env().context("cannot authenticate against Atlas")?;
        let config = FetchConfig {
            api_url: self.api_url,
            output_dir: self.output_dir,
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..FetchConfig::default()
        };
        let client = AtlasClient::new(&config, credentials).context("failed to set up API client")?;

        let id = OrderId::from(self.order_id.trim());
        tracing::info!("fetching order {id} from {}", client.api_url());

        let body = match client.fetch(&id) {
            FetchOutcome::Success { body } => body,
            FetchOutcome::NotFound => bail!("order {id} not found"),
            FetchOutcome::AuthError { status } => {
                bail!("authentication rejected (HTTP {status}); check URBANPIPER_AUTH_TOKEN / URBANPIPER_COOKIE")
            }
            FetchOutcome::Transient { reason } => bail!("request for order {id} failed: {reason}"),
            FetchOutcome::Other { status, snippet } => {
                let status = status.map_or_else(|| "-".to_string(), |s| s.to_string());
                bail!("unexpected response for order {id} (HTTP {status}): {snippet}")
            }
        };

        println!("{} order {id}", "✓".green().bold());
        println!("{}", preview(&body));

        if self.no_save {
            return Ok(());
        }
        let sink = OrderSink::prepare(&config.output_dir).with_context(|| {
            format!(
                "cannot create output directory {}",
                config.output_dir.display()
            )
        })?;
        match sink
            .persist(&id, &body)
            .with_context(|| format!("failed to save order {id}"))?
        {
            PersistResult::Written { path } => println!("  ✎  {}", path.display()),
            PersistResult::Skipped { path } => {
                println!("  ·  {} (already present, left unchanged)", path.display())
            }
        }
        Ok(())
    }
}

/// Pretty-printed body, cut to [`PREVIEW_CHARS`] characters.
fn preview(body: &str) -> String {
    let pretty = serde_json::from_str::<serde_json::Value>(body)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| body.to_string());
    match pretty.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &pretty[..cut]),
        None => pretty,
    }
}
