use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser, Debug)]
#[command(name = "bizfin", version, about = "Small business bookkeeping and tax estimates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate year-to-date income tax, levies and VAT
    Tax(cmd::tax::TaxCommand),
    /// Validate and import transactions from a CSV file
    Import(cmd::import::ImportCommand),
    /// Write the CSV import template
    Template(cmd::template::TemplateCommand),
    /// Export ledger transactions as CSV
    Export(cmd::export::ExportCommand),
    /// Paginated income and expense report
    Report(cmd::report::ReportCommand),
    /// Yearly totals, category breakdown and budget status
    Summary(cmd::summary::SummaryCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Tax(c) => c.exec(),
        Command::Import(c) => c.exec(),
        Command::Template(c) => c.exec(),
        Command::Export(c) => c.exec(),
        Command::Report(c) => c.exec(),
        Command::Summary(c) => c.exec(),
        Command::Schema(c) => c.exec(),
    }
}
