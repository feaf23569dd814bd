//! Export command - write ledger transactions as CSV in the import layout

use super::{open_output, read_ledger};
use crate::core::{write_transactions_csv, TaxYear};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Ledger JSON file
    #[arg(short, long)]
    ledger: PathBuf,

    /// Only export transactions dated in this year
    #[arg(short, long)]
    year: Option<i32>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ExportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = read_ledger(&self.ledger)?;
        let year = self.year.map(TaxYear);
        let selected = ledger
            .transactions
            .iter()
            .filter(|tx| year.is_none_or(|y| y.contains(tx.date)));

        let writer = open_output(self.output.as_deref())?;
        write_transactions_csv(selected, writer)
    }
}
