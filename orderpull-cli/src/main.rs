//! orderpull: batch fetch order records from the UrbanPiper Atlas API.
//!
//! # Usage
//!
//! ```text
//! orderpull fetch  [-w N] [-f orders.csv] [-o orders/] [--id-column ID] [--json]
//! orderpull probe  <ORDER_ID> [--no-save]
//! orderpull status [-f orders.csv] [-o orders/] [--json]
//! ```
//!
//! Credentials come from `URBANPIPER_AUTH_TOKEN` and/or `URBANPIPER_COOKIE`,
//! optionally via a `.env` file in the working directory.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{fetch::FetchArgs, probe::ProbeArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "orderpull",
    version,
    about = "Batch-download order records from the UrbanPiper Atlas API",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch every order listed in a CSV export, resuming where the last run stopped.
    Fetch(FetchArgs),

    /// Fetch a single order and print it, to check credentials and connectivity.
    Probe(ProbeArgs),

    /// Show how many orders of a CSV export have already been fetched.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Variables already set in the environment win over `.env`.
    dotenvy::dotenv().ok();
    init_tracing();

    match cli.command {
        Commands::Fetch(args) => args.run(),
        Commands::Probe(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

/// Logs go to stderr; stdout is reserved for the command's report.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
