//! `orderpull status`: resume visibility for a CSV export.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use orderpull_core::{read_order_ids, OrderId};
use orderpull_sync::{status, OrderSink, ResumeStatus};

use super::InputArgs;

/// Pending IDs listed in the human-readable report.
const PENDING_PREVIEW: usize = 10;

/// Arguments for `orderpull status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let ids = read_order_ids(&self.input.csv_file, &self.input.id_column).with_context(|| {
            format!(
                "failed to read order ids from {}",
                self.input.csv_file.display()
            )
        })?;
        let sink = OrderSink::at(&self.input.output_dir);
        let report = status::scan(ids, &sink).with_context(|| {
            format!(
                "failed to scan output directory {}",
                self.input.output_dir.display()
            )
        })?;

        if self.json {
            print_json(&report)?;
        } else {
            print_table(&report, &sink);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    #[serde(flatten)]
    report: &'a ResumeStatus,
    complete: bool,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "")]
    label: &'static str,
    #[tabled(rename = "orders")]
    count: usize,
}

fn print_json(report: &ResumeStatus) -> Result<()> {
    let payload = StatusJson {
        report,
        complete: report.is_complete(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: &ResumeStatus, sink: &OrderSink) {
    println!(
        "orderpull v{} | {}",
        env!("CARGO_PKG_VERSION"),
        sink.dir().display()
    );

    let rows = vec![
        StatusRow {
            label: "ids in input",
            count: report.total,
        },
        StatusRow {
            label: "distinct",
            count: report.distinct,
        },
        StatusRow {
            label: "fetched",
            count: report.fetched,
        },
        StatusRow {
            label: "pending",
            count: report.pending.len(),
        },
        StatusRow {
            label: "not in input",
            count: report.extra,
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if report.is_complete() {
        println!("{}", "All orders fetched.".green().bold());
        return;
    }

    println!(
        "{} pending: {}",
        "■".yellow().bold(),
        summarize_ids(&report.pending)
    );
    println!("Run 'orderpull fetch' to continue.");
}

fn summarize_ids(ids: &[OrderId]) -> String {
    let mut names: Vec<String> = ids
        .iter()
        .take(PENDING_PREVIEW)
        .map(|id| id.to_string())
        .collect();
    if ids.len() > names.len() {
        names.push(format!("+{} more", ids.len() - names.len()));
    }
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_ids_caps_the_list() {
        let ids: Vec<OrderId> = (0..13).map(|n| OrderId::from(n.to_string())).collect();
        let out = summarize_ids(&ids);
        assert!(out.starts_with("0, 1, 2"));
        assert!(out.ends_with("+3 more"));
    }

    #[test]
    fn summarize_ids_short_list_is_complete() {
        let ids = vec![OrderId::from("7"), OrderId::from("9")];
        assert_eq!(summarize_ids(&ids), "7, 9");
    }
}
