//! `orderpull fetch`: download every order in a CSV export.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use orderpull_core::{
    config::{DEFAULT_API_URL, DEFAULT_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT},
    read_order_ids, Credentials, FetchConfig, RunStatistics,
};
use orderpull_fetch::AtlasClient;
use orderpull_sync::{run_batch, BatchOptions, OrderSink};

use super::InputArgs;

/// Arguments for `orderpull fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Maximum number of requests in flight at once.
    #[arg(short, long, default_value_t = FetchConfig::default().workers)]
    pub workers: NonZeroUsize,

    #[command(flatten)]
    pub input: InputArgs,

    /// GraphQL endpoint to query.
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Pause each worker takes after a request, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_DELAY.as_millis() as u64)]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Emit the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl FetchArgs {
    pub fn run(self) -> Result<()> {
        // Everything that can fail at startup happens before the output
        // directory is created or any request is sent.
        let credentials = Credentials::from_env().context("cannot authenticate against Atlas")?;

        let config = FetchConfig {
            api_url: self.api_url,
            output_dir: self.input.output_dir,
            workers: self.workers,
            request_delay: Duration::from_millis(self.delay_ms),
            request_timeout: Duration::from_secs(self.timeout_secs),
            id_column: self.input.id_column,
            ..FetchConfig::default()
        };
        config.validate().context("invalid fetch options")?;

        let ids = read_order_ids(&self.input.csv_file, &config.id_column).with_context(|| {
            format!(
                "failed to read order ids from {}",
                self.input.csv_file.display()
            )
        })?;
        tracing::info!(
            "found {} order ids in {}",
            ids.len(),
            self.input.csv_file.display()
        );

        let client = AtlasClient::new(&config, credentials).context("failed to set up API client")?;
        let sink = OrderSink::prepare(&config.output_dir).with_context(|| {
            format!(
                "cannot create output directory {}",
                config.output_dir.display()
            )
        })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;
        let options = BatchOptions::from(&config);
        let stats = runtime.block_on(run_batch(
            ids,
            Arc::new(sink),
            Arc::new(client),
            &options,
        ));

        if self.json {
            print_json(&stats)?;
        } else {
            print_summary(&stats, &config);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct FetchReportJson<'a> {
    #[serde(flatten)]
    stats: &'a RunStatistics,
    distinct: usize,
    failed: usize,
    elapsed_secs: Option<f64>,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "orders")]
    count: usize,
}

fn elapsed_secs(stats: &RunStatistics) -> Option<f64> {
    stats
        .elapsed()
        .map(|d| d.num_milliseconds() as f64 / 1000.0)
}

fn print_json(stats: &RunStatistics) -> Result<()> {
    let payload = FetchReportJson {
        stats,
        distinct: stats.distinct(),
        failed: stats.failed(),
        elapsed_secs: elapsed_secs(stats),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize run summary")?
    );
    Ok(())
}

fn print_summary(stats: &RunStatistics, config: &FetchConfig) {
    let elapsed = elapsed_secs(stats)
        .map(|s| format!("{s:.1}s"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "orderpull v{} | {} ids | {} distinct | {} | {}",
        env!("CARGO_PKG_VERSION"),
        stats.total,
        stats.distinct(),
        elapsed,
        config.output_dir.display(),
    );

    let mut rows = vec![
        SummaryRow {
            outcome: "succeeded".green().to_string(),
            count: stats.succeeded,
        },
        SummaryRow {
            outcome: "skipped (already fetched)".bright_black().to_string(),
            count: stats.skipped,
        },
    ];
    for (kind, count) in stats.failure_breakdown() {
        rows.push(SummaryRow {
            outcome: format!("failed: {kind}").red().to_string(),
            count,
        });
    }
    if stats.duplicates > 0 {
        rows.push(SummaryRow {
            outcome: "duplicate ids ignored".yellow().to_string(),
            count: stats.duplicates,
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if stats.failed() > 0 {
        println!(
            "{} orders failed; run the same command again to retry them.",
            stats.failed().to_string().red().bold()
        );
    } else {
        println!("{}", "All orders fetched.".green().bold());
    }
}
