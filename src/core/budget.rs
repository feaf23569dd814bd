use super::transaction::{category_key, Transaction};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    fn contains(self, as_of: NaiveDate, date: NaiveDate) -> bool {
        match self {
            BudgetPeriod::Monthly => date.year() == as_of.year() && date.month() == as_of.month(),
            BudgetPeriod::Yearly => date.year() == as_of.year(),
        }
    }
}

/// Spending limit for one expense category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Budget {
    pub category: String,
    #[schemars(with = "f64")]
    pub limit: Decimal,
    #[serde(default)]
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub period: BudgetPeriod,
    pub limit: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    /// Percentage of the limit used, one decimal place
    pub utilisation: Decimal,
    pub over_budget: bool,
}

impl Budget {
    /// Spending against this budget for the period containing `as_of` (up to any date in it).
    pub fn status(&self, transactions: &[Transaction], as_of: NaiveDate) -> BudgetStatus {
        let category = category_key(&self.category);
        let spent = transactions
            .iter()
            .filter(|tx| tx.is_expense())
            .filter(|tx| category_key(&tx.category) == category)
            .filter(|tx| self.period.contains(as_of, tx.date))
            .fold(Decimal::ZERO, |acc, tx| acc.saturating_add(tx.amount));

        let utilisation = if self.limit > Decimal::ZERO {
            spent
                .checked_div(self.limit)
                .and_then(|ratio| ratio.checked_mul(dec!(100)))
                .map_or(Decimal::MAX, |pct| pct.round_dp(1))
        } else {
            Decimal::ZERO
        };

        BudgetStatus {
            category: self.category.clone(),
            period: self.period,
            limit: self.limit,
            spent,
            remaining: self.limit.saturating_sub(spent),
            utilisation,
            over_budget: spent > self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{NewTransaction, TransactionType};

    fn expense(amount: Decimal, on: (i32, u32, u32), category: &str) -> Transaction {
        NewTransaction {
            kind: TransactionType::Expense,
            amount,
            date: NaiveDate::from_ymd_opt(on.0, on.1, on.2).unwrap(),
            description: "spend".to_string(),
            category: category.to_string(),
            payment_source: "card".to_string(),
            notes: None,
            vat_amount: None,
        }
        .with_id("x")
    }

    #[test]
    fn monthly_budget_counts_current_month_only() {
        let budget = Budget {
            category: "Marketing".to_string(),
            limit: dec!(100000),
            period: BudgetPeriod::Monthly,
        };
        let txs = vec![
            expense(dec!(30000), (2024, 3, 2), "marketing"),
            expense(dec!(15000), (2024, 3, 28), "Marketing"),
            expense(dec!(99999), (2024, 2, 28), "Marketing"),
            expense(dec!(5000), (2024, 3, 5), "Rent"),
        ];
        let status = budget.status(&txs, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(status.spent, dec!(45000));
        assert_eq!(status.remaining, dec!(55000));
        assert_eq!(status.utilisation, dec!(45.0));
        assert!(!status.over_budget);
    }

    #[test]
    fn yearly_budget_reports_overspend() {
        let budget = Budget {
            category: "Travel".to_string(),
            limit: dec!(300),
            period: BudgetPeriod::Yearly,
        };
        let txs = vec![
            expense(dec!(200), (2024, 1, 2), "Travel"),
            expense(dec!(200), (2024, 11, 2), "Travel"),
        ];
        let status = budget.status(&txs, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(status.spent, dec!(400));
        assert_eq!(status.remaining, dec!(-100));
        assert_eq!(status.utilisation, dec!(133.3));
        assert!(status.over_budget);
    }

    #[test]
    fn zero_limit_has_zero_utilisation() {
        let budget = Budget {
            category: "Misc".to_string(),
            limit: Decimal::ZERO,
            period: BudgetPeriod::Monthly,
        };
        let status = budget.status(&[], NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(status.utilisation, Decimal::ZERO);
        assert!(!status.over_budget);
    }

    #[test]
    fn category_matching_agrees_with_summary_and_deductions() {
        use crate::core::policy::DeductionRule;
        use crate::core::summary::summarise_year;
        use crate::core::year::TaxYear;

        let txs = vec![
            expense(dec!(100), (2024, 3, 1), "\u{c9}QUIPEMENT"),
            expense(dec!(50), (2024, 3, 2), " \u{e9}quipement "),
        ];
        let budget = Budget {
            category: "\u{c9}quipement".to_string(),
            limit: dec!(1000),
            period: BudgetPeriod::Monthly,
        };
        let status = budget.status(&txs, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(status.spent, dec!(150));

        let summary = summarise_year(&txs, TaxYear(2024));
        assert_eq!(summary.categories.len(), 1);
        assert_eq!(summary.categories[0].total, dec!(150));

        let rule = DeductionRule::Categories {
            categories: vec!["\u{e9}quipement".to_string()],
        };
        assert!(txs.iter().all(|tx| rule.allows(&tx.category)));
    }

    #[test]
    fn huge_spend_against_tiny_limit_does_not_panic() {
        let budget = Budget {
            category: "Misc".to_string(),
            limit: dec!(0.01),
            period: BudgetPeriod::Yearly,
        };
        let txs = vec![
            expense(Decimal::MAX, (2024, 1, 1), "Misc"),
            expense(Decimal::MAX, (2024, 1, 2), "Misc"),
        ];
        let status = budget.status(&txs, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(status.spent, Decimal::MAX);
        assert_eq!(status.utilisation, Decimal::MAX);
        assert!(status.over_budget);
    }
}
