use super::transaction::{category_key, Transaction, TransactionType};
use super::year::TaxYear;
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub kind: TransactionType,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonthTotal {
    pub month: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

/// Dashboard figures for one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
    /// Income categories first, then expenses; largest total first within each
    pub categories: Vec<CategoryTotal>,
    pub months: Vec<MonthTotal>,
}

pub fn summarise_year(transactions: &[Transaction], year: TaxYear) -> YearSummary {
    // categories group case-insensitively, keeping the first spelling seen
    let mut categories: BTreeMap<(TransactionType, String), CategoryTotal> = BTreeMap::new();
    let mut months: Vec<MonthTotal> = (1..=12)
        .map(|month| MonthTotal {
            month,
            ..MonthTotal::default()
        })
        .collect();

    for tx in transactions.iter().filter(|tx| year.contains(tx.date)) {
        let label = tx.category.trim();
        let entry = categories
            .entry((tx.kind, category_key(label)))
            .or_insert_with(|| CategoryTotal {
                category: label.to_string(),
                kind: tx.kind,
                total: Decimal::ZERO,
                count: 0,
            });
        // ledger amounts are capped, so saturation is only reachable with unchecked input
        entry.total = entry.total.saturating_add(tx.amount);
        entry.count += 1;

        let month = &mut months[tx.date.month0() as usize];
        match tx.kind {
            TransactionType::Income => month.income = month.income.saturating_add(tx.amount),
            TransactionType::Expense => month.expenses = month.expenses.saturating_add(tx.amount),
        }
        month.net = month.net.saturating_add(tx.signed_amount());
    }

    let income = months
        .iter()
        .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.income));
    let expenses = months
        .iter()
        .fold(Decimal::ZERO, |acc, m| acc.saturating_add(m.expenses));

    let mut categories: Vec<_> = categories.into_values().collect();
    categories.sort_by(|a, b| a.kind.cmp(&b.kind).then(b.total.cmp(&a.total)));

    YearSummary {
        year: year.0,
        income,
        expenses,
        net: income.saturating_sub(expenses),
        categories,
        months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::NewTransaction;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(kind: TransactionType, amount: Decimal, on: &str, category: &str) -> Transaction {
        NewTransaction {
            kind,
            amount,
            date: NaiveDate::parse_from_str(on, "%Y-%m-%d").unwrap(),
            description: String::new(),
            category: category.to_string(),
            payment_source: "bank".to_string(),
            notes: None,
            vat_amount: None,
        }
        .with_id("t")
    }

    #[test]
    fn totals_by_category_and_month() {
        let txs = vec![
            tx(TransactionType::Income, dec!(1000), "2024-01-05", "Sales"),
            tx(TransactionType::Income, dec!(500), "2024-02-05", "sales"),
            tx(TransactionType::Income, dec!(700), "2024-02-06", "Consulting"),
            tx(TransactionType::Expense, dec!(300), "2024-02-07", "Rent"),
            tx(TransactionType::Expense, dec!(50), "2024-02-08", "Fuel"),
            tx(TransactionType::Income, dec!(9999), "2023-12-31", "Sales"),
        ];
        let summary = summarise_year(&txs, TaxYear(2024));

        assert_eq!(summary.income, dec!(2200));
        assert_eq!(summary.expenses, dec!(350));
        assert_eq!(summary.net, dec!(1850));

        let names: Vec<_> = summary
            .categories
            .iter()
            .map(|c| (c.category.as_str(), c.total, c.count))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Sales", dec!(1500), 2),
                ("Consulting", dec!(700), 1),
                ("Rent", dec!(300), 1),
                ("Fuel", dec!(50), 1),
            ]
        );

        assert_eq!(summary.months.len(), 12);
        assert_eq!(summary.months[0].net, dec!(1000));
        assert_eq!(summary.months[1].income, dec!(1200));
        assert_eq!(summary.months[1].expenses, dec!(350));
        assert_eq!(summary.months[1].net, dec!(850));
        assert_eq!(summary.months[11].net, Decimal::ZERO);
    }

    #[test]
    fn empty_year() {
        let summary = summarise_year(&[], TaxYear(2024));
        assert!(summary.categories.is_empty());
        assert_eq!(summary.net, Decimal::ZERO);
    }
}
