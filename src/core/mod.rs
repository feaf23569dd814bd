pub mod assessment;
pub mod budget;
pub mod currency;
pub mod document;
pub mod import;
pub mod invoice;
pub mod ledger;
pub mod policy;
pub mod settings;
pub mod summary;
pub mod tax;
pub mod template;
pub mod transaction;
pub mod year;

// Flat public surface for domain types and functions.
pub use assessment::{assess, TaxReport};
pub use budget::BudgetStatus;
pub use currency::{Currency, CurrencyContext};
pub use document::{Document, ReportRow};
pub use import::{commit_import, parse_transactions_csv, ImportOutcome, ImportPreview, RowError};
pub use ledger::{read_ledger_json, write_ledger_json, Ledger};
pub use policy::{read_policy_json, PolicyBook, TaxPolicy};
pub use settings::{read_settings_json, TaxSettings};
pub use summary::{summarise_year, YearSummary};
pub use tax::EstimateStatus;
pub use template::{write_template, write_transactions_csv, TransactionRow};
pub use year::TaxYear;
