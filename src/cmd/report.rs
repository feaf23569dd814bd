//! Report command - paginated plain-text income and expense report

use super::{currency_context, open_output, read_ledger, today};
use crate::core::{summarise_year, Currency, Document, ReportRow, TaxYear};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// Ledger JSON file
    #[arg(short, long)]
    ledger: PathBuf,

    /// Year to report on (defaults to the current year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Lines per page, including the page header and footer
    #[arg(long, default_value_t = 50)]
    page_height: usize,

    /// Display currency: NGN, USD, GBP or EUR (defaults to the ledger currency)
    #[arg(short, long)]
    currency: Option<Currency>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = read_ledger(&self.ledger)?;
        let year = self.year.map_or_else(|| TaxYear::from_date(today()), TaxYear);
        let currency = currency_context(&ledger, self.currency);

        let summary = summarise_year(&ledger.transactions, year);
        let rows: Vec<ReportRow> = summary.categories.iter().map(ReportRow::from).collect();
        let title = format!("Income and expenses {}", year.display());
        let document = Document::layout(&title, &rows, currency.current(), self.page_height);
        log::debug!("report laid out on {} page(s)", document.pages.len());

        let mut writer = open_output(self.output.as_deref())?;
        writeln!(writer, "{}", document.render())?;
        writer.flush()?;
        Ok(())
    }
}
