//! Summary command - yearly income, expenses, categories and budgets

use super::{currency_context, read_ledger, today};
use crate::core::{summarise_year, BudgetStatus, Currency, CurrencyContext, TaxYear, YearSummary};
use chrono::{Month, NaiveDate};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// Ledger JSON file
    #[arg(short, long)]
    ledger: PathBuf,

    /// Year to summarise (defaults to the year of --as-of)
    #[arg(short, long)]
    year: Option<i32>,

    /// Reference date for budget periods (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Display currency: NGN, USD, GBP or EUR (defaults to the ledger currency)
    #[arg(short, long)]
    currency: Option<Currency>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SummaryOutput {
    #[serde(flatten)]
    summary: YearSummary,
    budgets: Vec<BudgetStatus>,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Total")]
    total: String,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Income")]
    income: String,
    #[tabled(rename = "Expenses")]
    expenses: String,
    #[tabled(rename = "Net")]
    net: String,
}

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Spent")]
    spent: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Used")]
    utilisation: String,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let ledger = read_ledger(&self.ledger)?;
        let as_of = self.as_of.unwrap_or_else(today);
        let year = self.year.map_or_else(|| TaxYear::from_date(as_of), TaxYear);

        let summary = summarise_year(&ledger.transactions, year);
        let budgets: Vec<BudgetStatus> = ledger
            .budgets
            .iter()
            .map(|b| b.status(&ledger.transactions, as_of))
            .collect();

        if self.json {
            let output = SummaryOutput { summary, budgets };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let currency = currency_context(&ledger, self.currency);
        print_summary(&summary, &budgets, &currency);
        Ok(())
    }
}

fn print_summary(summary: &YearSummary, budgets: &[BudgetStatus], currency: &CurrencyContext) {
    println!();
    println!("SUMMARY {}", summary.year);
    println!();
    println!("Income:    {}", currency.format(summary.income));
    println!("Expenses:  {}", currency.format(summary.expenses));
    println!("Net:       {}", currency.format(summary.net));

    if summary.categories.is_empty() {
        println!();
        println!("No transactions in {}.", summary.year);
    } else {
        let rows: Vec<CategoryRow> = summary
            .categories
            .iter()
            .map(|c| CategoryRow {
                category: c.category.clone(),
                kind: c.kind.to_string(),
                count: c.count,
                total: currency.format(c.total),
            })
            .collect();
        println!();
        println!(
            "{}",
            Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        );

        let months: Vec<MonthRow> = summary
            .months
            .iter()
            .filter(|m| !m.income.is_zero() || !m.expenses.is_zero())
            .map(|m| MonthRow {
                month: month_name(m.month),
                income: currency.format(m.income),
                expenses: currency.format(m.expenses),
                net: currency.format(m.net),
            })
            .collect();
        println!();
        println!(
            "{}",
            Table::new(months)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        );
    }

    if !budgets.is_empty() {
        let rows: Vec<BudgetRow> = budgets
            .iter()
            .map(|b| BudgetRow {
                category: b.category.clone(),
                limit: currency.format(b.limit),
                spent: currency.format(b.spent),
                remaining: currency.format(b.remaining),
                utilisation: format!("{}%", b.utilisation),
            })
            .collect();
        println!();
        println!("BUDGETS");
        println!(
            "{}",
            Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        );
        for b in budgets.iter().filter(|b| b.over_budget) {
            println!("\u{26A0} {} is over budget", b.category);
        }
    }
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or_else(|| month.to_string(), |m| m.name().to_string())
}
