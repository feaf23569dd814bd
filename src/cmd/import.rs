//! Import command - bulk-load transactions from a CSV file into the ledger

use super::{open_input, read_ledger, write_ledger};
use crate::core::{commit_import, parse_transactions_csv, ImportOutcome, ImportPreview, RowError};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct ImportCommand {
    /// CSV file to import (use - for stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Ledger JSON file to import into (created if missing)
    #[arg(short, long)]
    ledger: PathBuf,

    /// Validate and preview only, do not write the ledger
    #[arg(long)]
    dry_run: bool,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Problem")]
    message: String,
}

impl From<&RowError> for ErrorRow {
    fn from(err: &RowError) -> Self {
        ErrorRow {
            row: err.row,
            field: err.field.clone(),
            message: err.message.clone(),
        }
    }
}

#[derive(Serialize)]
struct ImportOutput<'a> {
    dry_run: bool,
    valid_rows: usize,
    errors: &'a [RowError],
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a ImportOutcome>,
}

impl ImportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = open_input(&self.file)?;
        let preview = parse_transactions_csv(input)?;

        if !preview.is_valid() {
            self.print(&preview, None)?;
            // nothing is written while any row is invalid
            std::process::exit(1);
        }

        if self.dry_run {
            return self.print(&preview, None);
        }

        let mut ledger = read_ledger(&self.ledger)?;
        let outcome = commit_import(&preview, &mut ledger)?;
        if !outcome.created.is_empty() {
            write_ledger(&self.ledger, &ledger)?;
        }
        self.print(&preview, Some(&outcome))
    }

    fn print(&self, preview: &ImportPreview, outcome: Option<&ImportOutcome>) -> anyhow::Result<()> {
        if self.json {
            let output = ImportOutput {
                dry_run: self.dry_run,
                valid_rows: preview.transactions.len(),
                errors: &preview.errors,
                outcome,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!();
        if !preview.is_valid() {
            println!(
                "\u{26A0} {} validation error(s), nothing was imported:",
                preview.errors.len()
            );
            println!();
            let rows: Vec<ErrorRow> = preview.errors.iter().map(ErrorRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            return Ok(());
        }

        match outcome {
            None => {
                println!(
                    "\u{2713} {} row(s) valid, ready to import.",
                    preview.transactions.len()
                );
            }
            Some(outcome) => {
                println!(
                    "\u{2713} Imported {} transaction(s) into {}.",
                    outcome.created.len(),
                    self.ledger.display()
                );
                if !outcome.failures.is_empty() {
                    println!();
                    println!("\u{26A0} {} row(s) failed to insert:", outcome.failures.len());
                    for failure in &outcome.failures {
                        println!("  row {}: {}", failure.row, failure.message);
                    }
                }
            }
        }
        Ok(())
    }
}
