use super::invoice::Invoice;
use super::policy::{DeductionRule, PolicyBook};
use super::settings::TaxSettings;
use super::tax::{calculate_tax_liability, calculate_vat_liability, TaxEstimate, TaxInputs, VatLiability};
use super::transaction::Transaction;
use super::year::{TaxYear, YtdWindow};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Year-to-date totals derived from the ledger, as fed to the tax engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxSnapshot {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub turnover_ytd: Decimal,
    pub total_expenses: Decimal,
    pub deductible_expenses: Decimal,
    pub taxable_income: Decimal,
    pub vat_collected: Decimal,
    pub vat_paid: Decimal,
}

/// A running total left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("amounts overflow")]
pub struct AmountOverflow;

fn accumulate(total: &mut Decimal, amount: Decimal) -> Result<(), AmountOverflow> {
    *total = total.checked_add(amount).ok_or(AmountOverflow)?;
    Ok(())
}

impl TaxSnapshot {
    pub fn from_records(
        transactions: &[Transaction],
        invoices: &[Invoice],
        as_of: NaiveDate,
        deductions: &DeductionRule,
    ) -> Result<Self, AmountOverflow> {
        let window = YtdWindow::ending(as_of);
        let mut turnover_ytd = Decimal::ZERO;
        let mut total_expenses = Decimal::ZERO;
        let mut deductible_expenses = Decimal::ZERO;
        let mut vat_paid = Decimal::ZERO;
        let mut vat_collected = Decimal::ZERO;

        for tx in transactions.iter().filter(|tx| window.contains(tx.date)) {
            if tx.is_income() {
                accumulate(&mut turnover_ytd, tx.amount)?;
            } else {
                accumulate(&mut total_expenses, tx.amount)?;
                if deductions.allows(&tx.category) {
                    accumulate(&mut deductible_expenses, tx.amount)?;
                    accumulate(&mut vat_paid, tx.vat_amount.unwrap_or(Decimal::ZERO))?;
                }
            }
        }

        for (date, vat) in invoices.iter().filter_map(Invoice::vat_collected_on) {
            if window.contains(date) {
                accumulate(&mut vat_collected, vat)?;
            }
        }

        let taxable_income = turnover_ytd
            .checked_sub(deductible_expenses)
            .ok_or(AmountOverflow)?
            .max(Decimal::ZERO);

        Ok(TaxSnapshot {
            from: window.start,
            to: window.end,
            turnover_ytd,
            total_expenses,
            deductible_expenses,
            taxable_income,
            vat_collected,
            vat_paid,
        })
    }

    /// All-zero snapshot for the window ending at `as_of`.
    fn empty(as_of: NaiveDate) -> Self {
        let window = YtdWindow::ending(as_of);
        TaxSnapshot {
            from: window.start,
            to: window.end,
            turnover_ytd: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            deductible_expenses: Decimal::ZERO,
            taxable_income: Decimal::ZERO,
            vat_collected: Decimal::ZERO,
            vat_paid: Decimal::ZERO,
        }
    }

    pub fn inputs(&self) -> TaxInputs {
        TaxInputs {
            turnover_ytd: self.turnover_ytd,
            taxable_income: self.taxable_income,
        }
    }
}

/// Everything the tax dashboard shows for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxReport {
    pub tax_year: i32,
    pub policy_version: Option<String>,
    pub snapshot: TaxSnapshot,
    pub estimate: TaxEstimate,
    /// Present only for VAT registered businesses
    pub vat: Option<VatLiability>,
}

/// Recompute the tax position for the year containing `as_of`.
///
/// `as_of` is the only date input; nothing here reads the clock.
pub fn assess(
    transactions: &[Transaction],
    invoices: &[Invoice],
    settings: Option<&TaxSettings>,
    policies: &PolicyBook,
    as_of: NaiveDate,
) -> TaxReport {
    let tax_year = TaxYear::from_date(as_of);
    let policy = policies.for_year(tax_year);

    let deductions = match (settings, &policy) {
        (Some(settings), Ok(policy)) => policy.deduction_rule(settings.business_type).clone(),
        _ => DeductionRule::NoDeductions,
    };
    let (snapshot, estimate) =
        match TaxSnapshot::from_records(transactions, invoices, as_of, &deductions) {
            Ok(snapshot) => {
                let estimate = match &policy {
                    Ok(policy) => calculate_tax_liability(&snapshot.inputs(), settings, policy),
                    Err(err) => TaxEstimate::not_computable(err.to_string()),
                };
                (Some(snapshot), estimate)
            }
            Err(err) => (None, TaxEstimate::not_computable(err.to_string())),
        };

    let vat = match (&snapshot, settings) {
        (Some(snapshot), Some(settings)) if settings.vat_registered => Some(
            calculate_vat_liability(snapshot.vat_collected, snapshot.vat_paid),
        ),
        _ => None,
    };

    TaxReport {
        tax_year: tax_year.0,
        policy_version: policy.ok().map(|p| p.version.clone()),
        snapshot: snapshot.unwrap_or_else(|| TaxSnapshot::empty(as_of)),
        estimate,
        vat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invoice::InvoiceStatus;
    use crate::core::settings::BusinessType;
    use crate::core::tax::EstimateStatus;
    use crate::core::transaction::{NewTransaction, TransactionType};
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tx(id: &str, kind: TransactionType, amount: Decimal, on: &str, category: &str) -> Transaction {
        NewTransaction {
            kind,
            amount,
            date: date(on),
            description: format!("{category} {id}"),
            category: category.to_string(),
            payment_source: "bank".to_string(),
            notes: None,
            vat_amount: None,
        }
        .with_id(id)
    }

    fn paid_invoice(id: &str, vat: Decimal, paid: &str) -> Invoice {
        Invoice {
            id: id.to_string(),
            status: InvoiceStatus::Paid,
            total_amount: vat * dec!(10),
            tax_amount: vat,
            paid_date: Some(date(paid)),
        }
    }

    fn ledger() -> (Vec<Transaction>, Vec<Invoice>) {
        let mut rent = tx("4", TransactionType::Expense, dec!(200000), "2024-03-01", "Rent");
        rent.record.vat_amount = Some(dec!(15000));
        let mut lunch = tx("5", TransactionType::Expense, dec!(50000), "2024-03-02", "Entertainment");
        lunch.record.vat_amount = Some(dec!(3750));
        let transactions = vec![
            tx("1", TransactionType::Income, dec!(1000000), "2024-01-10", "Sales"),
            tx("2", TransactionType::Income, dec!(500000), "2024-06-30", "Sales"),
            // outside the window
            tx("3", TransactionType::Income, dec!(999999), "2023-12-31", "Sales"),
            tx("6", TransactionType::Income, dec!(777777), "2024-07-01", "Sales"),
            rent,
            lunch,
        ];
        let invoices = vec![
            paid_invoice("a", dec!(7500), "2024-02-01"),
            paid_invoice("b", dec!(1000), "2024-08-01"),
            Invoice {
                id: "c".to_string(),
                status: InvoiceStatus::Sent,
                total_amount: dec!(10000),
                tax_amount: dec!(750),
                paid_date: None,
            },
        ];
        (transactions, invoices)
    }

    #[test]
    fn snapshot_limits_to_year_to_date() {
        let (transactions, invoices) = ledger();
        let snapshot = TaxSnapshot::from_records(
            &transactions,
            &invoices,
            date("2024-06-30"),
            &DeductionRule::AllExpenses,
        )
        .unwrap();
        assert_eq!(snapshot.from, date("2024-01-01"));
        assert_eq!(snapshot.turnover_ytd, dec!(1500000));
        assert_eq!(snapshot.total_expenses, dec!(250000));
        assert_eq!(snapshot.deductible_expenses, dec!(250000));
        assert_eq!(snapshot.taxable_income, dec!(1250000));
        assert_eq!(snapshot.vat_collected, dec!(7500));
        assert_eq!(snapshot.vat_paid, dec!(18750));
    }

    #[test]
    fn snapshot_honours_category_deductions() {
        let (transactions, invoices) = ledger();
        let rule = DeductionRule::Categories {
            categories: vec!["rent".to_string()],
        };
        let snapshot =
            TaxSnapshot::from_records(&transactions, &invoices, date("2024-06-30"), &rule).unwrap();
        assert_eq!(snapshot.total_expenses, dec!(250000));
        assert_eq!(snapshot.deductible_expenses, dec!(200000));
        assert_eq!(snapshot.taxable_income, dec!(1300000));
        assert_eq!(snapshot.vat_paid, dec!(15000));
    }

    #[test]
    fn taxable_income_floors_at_zero() {
        let transactions = vec![tx("1", TransactionType::Expense, dec!(10), "2024-01-01", "Rent")];
        let snapshot =
            TaxSnapshot::from_records(&transactions, &[], date("2024-12-31"), &DeductionRule::AllExpenses)
                .unwrap();
        assert_eq!(snapshot.taxable_income, Decimal::ZERO);
    }

    #[test]
    fn assess_reports_vat_only_when_registered() {
        let (transactions, invoices) = ledger();
        let book = PolicyBook::default();
        let mut settings = TaxSettings {
            business_type: BusinessType::SmallCompany,
            ..TaxSettings::default()
        };

        let report = assess(&transactions, &invoices, Some(&settings), &book, date("2024-06-30"));
        assert_eq!(report.vat, None);
        assert!(report.estimate.small_business_qualified);
        assert_eq!(report.policy_version.as_deref(), Some("NG-2024"));

        settings.vat_registered = true;
        let report = assess(&transactions, &invoices, Some(&settings), &book, date("2024-06-30"));
        let vat = report.vat.unwrap();
        assert_eq!(vat.net_vat_liability, dec!(-11250));
        assert!(vat.is_refund());
    }

    #[test]
    fn assess_without_settings_is_not_computable() {
        let (transactions, invoices) = ledger();
        let report = assess(&transactions, &invoices, None, &PolicyBook::default(), date("2024-06-30"));
        assert!(!report.estimate.is_computed());
        assert_eq!(report.vat, None);
        assert_eq!(report.snapshot.deductible_expenses, Decimal::ZERO);
    }

    #[test]
    fn assess_without_policy_for_year_is_not_computable() {
        let (transactions, invoices) = ledger();
        let settings = TaxSettings::default();
        let report = assess(&transactions, &invoices, Some(&settings), &PolicyBook::default(), date("2019-06-30"));
        assert_eq!(report.policy_version, None);
        assert!(matches!(
            report.estimate.status,
            EstimateStatus::NotComputable { .. }
        ));
        assert_eq!(report.estimate.liability.total_tax, Decimal::ZERO);
    }

    #[test]
    fn assess_is_deterministic() {
        let (transactions, invoices) = ledger();
        let settings = TaxSettings {
            business_type: BusinessType::Company,
            vat_registered: true,
            ..TaxSettings::default()
        };
        let book = PolicyBook::default();
        let first = assess(&transactions, &invoices, Some(&settings), &book, date("2024-06-30"));
        let second = assess(&transactions, &invoices, Some(&settings), &book, date("2024-06-30"));
        assert_eq!(first, second);
    }

    #[test]
    fn overflowing_totals_are_not_computable() {
        let half = Decimal::MAX / dec!(2) + dec!(1);
        let transactions = vec![
            tx("1", TransactionType::Income, half, "2024-01-10", "Sales"),
            tx("2", TransactionType::Income, half, "2024-02-10", "Sales"),
            tx("3", TransactionType::Income, half, "2024-03-10", "Sales"),
        ];
        let settings = TaxSettings {
            business_type: BusinessType::Company,
            vat_registered: true,
            ..TaxSettings::default()
        };
        let report = assess(&transactions, &[], Some(&settings), &PolicyBook::default(), date("2024-06-30"));
        assert_eq!(
            report.estimate.status,
            EstimateStatus::NotComputable {
                reason: "amounts overflow".to_string()
            }
        );
        assert_eq!(report.estimate.liability.total_tax, Decimal::ZERO);
        assert_eq!(report.snapshot.turnover_ytd, Decimal::ZERO);
        assert_eq!(report.vat, None);
    }
}
