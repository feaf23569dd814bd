use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Largest amount accepted on a single record. Keeps every total the ledger can
/// produce far inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Key under which categories are compared: trimmed and lowercased.
pub fn category_key(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Direction of a transaction. Amounts are stored as unsigned magnitudes and
/// this discriminant carries the sign.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn parse(s: &str) -> Option<TransactionType> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction that has not been persisted yet (no id assigned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Unsigned magnitude
    #[schemars(with = "f64")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub payment_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// VAT included in the amount (paid on expenses, charged on income)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub vat_amount: Option<Decimal>,
}

impl NewTransaction {
    pub fn with_id(self, id: impl Into<String>) -> Transaction {
        Transaction {
            id: id.into(),
            record: self,
        }
    }
}

/// A persisted transaction belonging to the account's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    pub id: String,
    #[serde(flatten)]
    pub record: NewTransaction,
}

impl std::ops::Deref for Transaction {
    type Target = NewTransaction;

    fn deref(&self) -> &NewTransaction {
        &self.record
    }
}

impl NewTransaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Amount with the sign implied by the type; only for display and netting.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}
