pub mod fetch;
pub mod probe;
pub mod status;

use std::path::PathBuf;

use clap::Args;

use orderpull_core::{
    config::{DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_DIR},
    ColumnSelector,
};

/// Input file and output directory, shared by `fetch` and `status`.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// CSV export listing the orders to fetch.
    #[arg(short = 'f', long = "csv-file", default_value = DEFAULT_INPUT_FILE)]
    pub csv_file: PathBuf,

    /// Directory holding one `<id>.json` per fetched order.
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Header name (or zero-based index) of the column holding order IDs.
    #[arg(long, default_value = "ID")]
    pub id_column: ColumnSelector,
}
