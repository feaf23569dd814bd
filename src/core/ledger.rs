use super::budget::Budget;
use super::currency::Currency;
use super::invoice::Invoice;
use super::transaction::{NewTransaction, Transaction, MAX_AMOUNT};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("duplicate transaction id: {0}")]
    DuplicateTransactionId(String),
    #[error("transaction {id}: amount must be a positive magnitude no larger than {}, got {amount}", MAX_AMOUNT)]
    InvalidAmount { id: String, amount: Decimal },
    #[error("transaction {id}: VAT amount must be between 0 and {}, got {vat_amount}", MAX_AMOUNT)]
    InvalidVatAmount { id: String, vat_amount: Decimal },
    #[error("invoice {id}: amounts must be between 0 and {}", MAX_AMOUNT)]
    InvalidInvoiceAmount { id: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("amount must be greater than zero and at most {}, got {0}", MAX_AMOUNT)]
    InvalidAmount(Decimal),
    #[error("store rejected the record: {0}")]
    Rejected(String),
}

/// Backend record source for one account: accepts creates one record at a time.
pub trait TransactionStore {
    fn create(&mut self, transaction: NewTransaction) -> Result<Transaction, StoreError>;
}

/// All records of an account, as persisted in the ledger JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Ledger {
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
}

impl Ledger {
    pub fn validate(&self) -> Result<(), LedgerError> {
        let mut ids = HashSet::new();
        for tx in &self.transactions {
            if !ids.insert(tx.id.as_str()) {
                return Err(LedgerError::DuplicateTransactionId(tx.id.clone()));
            }
            if !is_valid_amount(tx.amount) {
                return Err(LedgerError::InvalidAmount {
                    id: tx.id.clone(),
                    amount: tx.amount,
                });
            }
            if let Some(vat_amount) = tx.vat_amount {
                if !is_valid_vat_amount(vat_amount) {
                    return Err(LedgerError::InvalidVatAmount {
                        id: tx.id.clone(),
                        vat_amount,
                    });
                }
            }
        }
        let in_range = |v: Decimal| v >= Decimal::ZERO && v <= MAX_AMOUNT;
        for invoice in &self.invoices {
            if !in_range(invoice.total_amount) || !in_range(invoice.tax_amount) {
                return Err(LedgerError::InvalidInvoiceAmount {
                    id: invoice.id.clone(),
                });
            }
        }
        Ok(())
    }

    fn next_id(&self) -> String {
        let highest = self
            .transactions
            .iter()
            .filter_map(|tx| tx.id.strip_prefix("tx-"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max();
        match highest {
            None => "tx-1".to_string(),
            Some(n) => match n.checked_add(1) {
                Some(next) => format!("tx-{next}"),
                // numbering exhausted: reuse the lowest free number
                None => {
                    let taken: HashSet<&str> =
                        self.transactions.iter().map(|tx| tx.id.as_str()).collect();
                    (1..=self.transactions.len() + 1)
                        .map(|n| format!("tx-{n}"))
                        .find(|id| !taken.contains(id.as_str()))
                        .unwrap_or_else(|| format!("tx-{}", self.transactions.len() + 1))
                }
            },
        }
    }
}

fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= MAX_AMOUNT
}

fn is_valid_vat_amount(vat_amount: Decimal) -> bool {
    vat_amount >= Decimal::ZERO && vat_amount <= MAX_AMOUNT
}

impl TransactionStore for Ledger {
    fn create(&mut self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        if !is_valid_amount(transaction.amount) {
            return Err(StoreError::InvalidAmount(transaction.amount));
        }
        if let Some(vat_amount) = transaction.vat_amount.filter(|v| !is_valid_vat_amount(*v)) {
            return Err(StoreError::Rejected(format!(
                "VAT amount {vat_amount} is out of range"
            )));
        }
        let created = transaction.with_id(self.next_id());
        log::debug!(
            "created {} {} {} on {}",
            created.id,
            created.kind,
            created.amount,
            created.date
        );
        self.transactions.push(created.clone());
        Ok(created)
    }
}

/// Read a ledger from JSON, sorted by date, rejecting invalid records.
pub fn read_ledger_json<R: Read>(reader: R) -> anyhow::Result<Ledger> {
    let mut ledger: Ledger = serde_json::from_reader(reader)?;
    ledger.validate()?;
    ledger.transactions.sort_by_key(|tx| tx.date);
    Ok(ledger)
}

pub fn write_ledger_json<W: Write>(ledger: &Ledger, writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, ledger)?;
    Ok(())
}
