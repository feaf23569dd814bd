//! Schema command - print expected input formats

use crate::core::{Ledger, TaxPolicy, TaxSettings, TransactionRow};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "csv-fields")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the ledger file
    LedgerJson,
    /// JSON Schema for the settings file
    SettingsJson,
    /// JSON Schema for a tax policy file
    PolicyJson,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = match self.format {
            SchemaFormat::LedgerJson => schema_for!(Ledger),
            SchemaFormat::SettingsJson => schema_for!(TaxSettings),
            SchemaFormat::PolicyJson => schema_for!(TaxPolicy),
            SchemaFormat::CsvHeader => {
                println!("{}", TransactionRow::csv_header().join(","));
                return Ok(());
            }
            SchemaFormat::CsvFields => {
                print_csv_fields();
                return Ok(());
            }
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}

fn print_csv_fields() {
    println!("CSV Import Format");
    println!("=================");
    println!();
    for field in TransactionRow::csv_schema() {
        let req = if field.required { "required" } else { "optional" };
        println!("{:16} ({:8})  {}", field.name, req, field.description);
    }
    println!();
    println!("Header names are matched ignoring case, spaces and underscores.");
}
