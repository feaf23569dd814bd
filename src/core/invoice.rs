use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

/// Invoice subset needed for VAT: `tax_amount` is the VAT charged to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[schemars(with = "f64")]
    pub total_amount: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

impl Invoice {
    /// VAT counts as collected once the invoice is paid; the paid date places it in a period.
    pub fn vat_collected_on(&self) -> Option<(NaiveDate, Decimal)> {
        match (self.status, self.paid_date) {
            (InvoiceStatus::Paid, Some(date)) => Some((date, self.tax_amount)),
            _ => None,
        }
    }
}
