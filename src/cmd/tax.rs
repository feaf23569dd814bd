//! Tax command - year-to-date tax liability and VAT position

use super::{currency_context, read_ledger, read_policies, read_settings, today};
use crate::core::{assess, Currency, CurrencyContext, EstimateStatus, TaxReport};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct TaxCommand {
    /// Ledger JSON file with transactions and invoices
    #[arg(short, long)]
    ledger: PathBuf,

    /// Tax settings JSON file (business type, VAT registration)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Tax policy JSON file (defaults to the built-in policy)
    #[arg(short, long)]
    policy: Option<PathBuf>,

    /// Compute year to date as of this date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Display currency: NGN, USD, GBP or EUR (defaults to the ledger currency)
    #[arg(short, long)]
    currency: Option<Currency>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Item")]
    item: &'static str,
    #[tabled(rename = "Amount")]
    amount: String,
}

impl TaxCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = read_ledger(&self.ledger)?;
        let settings = read_settings(self.settings.as_deref())?;
        let policies = read_policies(self.policy.as_deref())?;
        let as_of = self.as_of.unwrap_or_else(today);

        let report = assess(
            &ledger.transactions,
            &ledger.invoices,
            settings.as_ref(),
            &policies,
            as_of,
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            let currency = currency_context(&ledger, self.currency);
            print_report(&report, &currency);
        }
        Ok(())
    }
}

fn print_report(report: &TaxReport, currency: &CurrencyContext) {
    let snapshot = &report.snapshot;
    let estimate = &report.estimate;
    let money = |amount: Decimal| currency.format(amount);

    println!();
    println!(
        "TAX ESTIMATE {} ({} to {}){}",
        report.tax_year,
        snapshot.from,
        snapshot.to,
        report
            .policy_version
            .as_deref()
            .map_or(String::new(), |v| format!(" - policy {v}"))
    );
    println!();

    let mut rows = vec![
        LineRow {
            item: "Turnover",
            amount: money(snapshot.turnover_ytd),
        },
        LineRow {
            item: "Deductible expenses",
            amount: money(snapshot.deductible_expenses),
        },
        LineRow {
            item: "Taxable income",
            amount: money(snapshot.taxable_income),
        },
    ];

    if estimate.is_computed() {
        let l = &estimate.liability;
        rows.extend([
            LineRow {
                item: "Income tax",
                amount: money(l.income_tax),
            },
            LineRow {
                item: "Education tax",
                amount: money(l.education_tax),
            },
            LineRow {
                item: "IT levy",
                amount: money(l.it_levy),
            },
            LineRow {
                item: "Total tax",
                amount: money(l.total_tax),
            },
        ]);
    }

    if let Some(vat) = &report.vat {
        rows.extend([
            LineRow {
                item: "VAT collected",
                amount: money(vat.vat_collected),
            },
            LineRow {
                item: "VAT paid",
                amount: money(vat.vat_paid),
            },
            LineRow {
                item: "Net VAT",
                amount: money(vat.net_vat_liability),
            },
        ]);
    }

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    match &estimate.status {
        EstimateStatus::NotComputable { reason } => {
            println!();
            println!("\u{26A0} Tax could not be computed: {reason}");
        }
        EstimateStatus::Computed if estimate.small_business_qualified => {
            println!();
            println!("\u{2713} Small company exemption applies: no income tax due.");
        }
        EstimateStatus::Computed => {}
    }
    if report.vat.is_some_and(|v| v.is_refund()) {
        println!("\u{2713} VAT refund position.");
    }
}
