//! CSV layout shared by the import template, the import parser and CSV export.

use super::transaction::{NewTransaction, Transaction};
use bizfin_derive::CsvSchema;
use serde::Serialize;
use std::io::Write;

/// Column description generated by `#[derive(CsvSchema)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// One transaction as a CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, CsvSchema)]
pub struct TransactionRow {
    /// Transaction date (YYYY-MM-DD, YYYY/MM/DD or DD/MM/YYYY)
    pub date: String,
    /// What the money was for
    pub description: String,
    /// Category, e.g. Sales, Rent, Salaries
    pub category: String,
    /// Positive amount; thousands separators are allowed
    pub amount: String,
    /// income or expense
    #[serde(rename = "type")]
    pub kind: String,
    /// Where the money moved, e.g. bank, cash, card
    pub payment_source: String,
    /// Free-text notes
    pub notes: Option<String>,
}

impl From<&NewTransaction> for TransactionRow {
    fn from(tx: &NewTransaction) -> Self {
        TransactionRow {
            date: tx.date.format("%Y-%m-%d").to_string(),
            description: tx.description.clone(),
            category: tx.category.clone(),
            amount: format!("{:.2}", tx.amount),
            kind: tx.kind.to_string(),
            payment_source: tx.payment_source.clone(),
            notes: tx.notes.clone(),
        }
    }
}

const EXAMPLE_ROWS: &[[&str; 7]] = &[
    [
        "2024-01-15",
        "Website design for client",
        "Sales",
        "250000.00",
        "income",
        "bank",
        "Invoice INV-001",
    ],
    [
        "2024-01-20",
        "Office rent January",
        "Rent",
        "150000.00",
        "expense",
        "bank",
        "",
    ],
    [
        "2024-01-22",
        "Printer paper",
        "Office Supplies",
        "12500.00",
        "expense",
        "cash",
        "Receipt kept",
    ],
];

fn example_rows() -> impl Iterator<Item = TransactionRow> {
    EXAMPLE_ROWS.iter().map(|[date, description, category, amount, kind, source, notes]| {
        TransactionRow {
            date: date.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            amount: amount.to_string(),
            kind: kind.to_string(),
            payment_source: source.to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        }
    })
}

/// Downloadable import template: the fixed header plus example rows.
pub fn write_template<W: Write>(writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in example_rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export transactions in the import layout, so an export can be re-imported.
pub fn write_transactions_csv<'a, I, W>(transactions: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = &'a Transaction>,
    W: Write,
{
    // header written by hand so an empty export still has one
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(TransactionRow::csv_header())?;
    for tx in transactions {
        wtr.serialize(TransactionRow::from(&tx.record))?;
    }
    wtr.flush()?;
    Ok(())
}
