//! Bulk transaction import from CSV.
//!
//! Parsing validates every row independently and collects row-scoped errors
//! instead of failing the file. Committing is only allowed once there are no
//! validation errors, and then creates each row on its own: a failed insert is
//! reported but neither stops the batch nor undoes earlier inserts.

use super::ledger::TransactionStore;
use super::template::TransactionRow;
use super::transaction::{NewTransaction, Transaction, TransactionType, MAX_AMOUNT};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("file has no header row")]
    EmptyFile,
    #[error("{count} validation error(s); nothing was imported")]
    ValidationFailed { count: usize },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Validation problem with one field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// Line number in the file; the header is line 1
    pub row: usize,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTransaction {
    pub row: usize,
    pub transaction: NewTransaction,
}

/// Result of the parse phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportPreview {
    pub transactions: Vec<ParsedTransaction>,
    pub errors: Vec<RowError>,
}

impl ImportPreview {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A row that passed validation but was rejected by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertFailure {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub created: Vec<Transaction>,
    pub failures: Vec<InsertFailure>,
}

/// Lowercase with spaces, underscores and dashes removed, so that
/// `Payment Source`, `payment_source` and `PaymentSource` all match.
fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

struct Columns {
    index: HashMap<&'static str, usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Result<Self, ImportError> {
        let positions: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (normalize_header(name), i))
            .collect();

        let mut index = HashMap::new();
        let mut missing = Vec::new();
        for field in TransactionRow::csv_schema() {
            match positions.get(&normalize_header(field.name)) {
                Some(&i) => {
                    index.insert(field.name, i);
                }
                None if field.required => missing.push(field.name.to_string()),
                None => {}
            }
        }
        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }
        Ok(Columns { index })
    }

    /// Column name for a field position, for errors raised before the row is parsed.
    fn name_at(&self, position: usize) -> String {
        self.index
            .iter()
            .find(|(_, &i)| i == position)
            .map_or_else(|| format!("column {}", position + 1), |(name, _)| name.to_string())
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, column: &str) -> Option<&'r str> {
        self.index
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn parse_amount(value: &str) -> Option<Decimal> {
    let cleaned: String = value
        .trim_start_matches(['\u{20A6}', '$', '\u{00A3}', '\u{20AC}'])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    Decimal::from_str(cleaned.trim()).ok()
}

struct RowParser<'a> {
    row: usize,
    record: &'a csv::StringRecord,
    columns: &'a Columns,
    errors: Vec<RowError>,
}

impl<'a> RowParser<'a> {
    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(RowError {
            row: self.row,
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required(&mut self, field: &str) -> Option<&'a str> {
        let value = self.columns.get(self.record, field);
        if value.is_none() {
            self.error(field, format!("{field} is required"));
        }
        value
    }

    fn optional(&self, field: &str) -> Option<&'a str> {
        self.columns.get(self.record, field)
    }

    fn parse(mut self) -> Result<NewTransaction, Vec<RowError>> {
        let date = self.required("date").and_then(|v| {
            let parsed = parse_date(v);
            if parsed.is_none() {
                self.error("date", format!("'{v}' is not a valid date (use YYYY-MM-DD)"));
            }
            parsed
        });
        let description = self.required("description");
        let category = self.required("category");
        let amount = self.required("amount").and_then(|v| match parse_amount(v) {
            None => {
                self.error("amount", format!("'{v}' is not a number"));
                None
            }
            Some(a) if a <= Decimal::ZERO => {
                self.error(
                    "amount",
                    format!("{a} must be greater than zero; use the type column for expenses"),
                );
                None
            }
            Some(a) if a > MAX_AMOUNT => {
                self.error("amount", format!("{a} is larger than {MAX_AMOUNT}"));
                None
            }
            Some(a) => Some(a),
        });
        let kind = self.required("type").and_then(|v| {
            let parsed = TransactionType::parse(v);
            if parsed.is_none() {
                self.error("type", format!("'{v}' must be income or expense"));
            }
            parsed
        });
        let payment_source = self.required("payment_source");
        let notes = self.optional("notes");

        match (date, description, category, amount, kind, payment_source) {
            (Some(date), Some(description), Some(category), Some(amount), Some(kind), Some(source))
                if self.errors.is_empty() =>
            {
                Ok(NewTransaction {
                    kind,
                    amount,
                    date,
                    description: description.to_string(),
                    category: category.to_string(),
                    payment_source: source.to_string(),
                    notes: notes.map(str::to_string),
                    vat_amount: None,
                })
            }
            _ => Err(self.errors),
        }
    }
}

/// Parse and validate a CSV file of transactions.
///
/// Only a missing header or missing required columns fail the whole file;
/// everything else becomes a [`RowError`].
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<ImportPreview, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = rdr.headers()?.clone();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::EmptyFile);
    }
    let columns = Columns::from_header(&header)?;

    let mut preview = ImportPreview::default();
    for (i, result) in rdr.byte_records().enumerate() {
        // header is line 1
        let fallback_row = i + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                let row = err
                    .position()
                    .map_or(fallback_row, |p| p.line() as usize);
                log::warn!("row {row}: unreadable record: {err}");
                preview.errors.push(RowError {
                    row,
                    field: "record".to_string(),
                    message: format!("row could not be read: {err}"),
                });
                continue;
            }
        };
        let row = record
            .position()
            .map_or(fallback_row, |p| p.line() as usize);

        let record = match csv::StringRecord::from_byte_record(record) {
            Ok(record) => record,
            Err(err) => {
                preview.errors.push(RowError {
                    row,
                    field: columns.name_at(err.utf8_error().field()),
                    message: "contains invalid UTF-8; save the file as UTF-8".to_string(),
                });
                continue;
            }
        };

        if record.iter().all(|field| field.trim().is_empty()) {
            log::debug!("skipping blank row {row}");
            continue;
        }

        let parser = RowParser {
            row,
            record: &record,
            columns: &columns,
            errors: Vec::new(),
        };
        match parser.parse() {
            Ok(transaction) => preview.transactions.push(ParsedTransaction { row, transaction }),
            Err(mut errors) => preview.errors.append(&mut errors),
        }
    }

    log::info!(
        "parsed {} row(s), {} validation error(s)",
        preview.transactions.len(),
        preview.errors.len()
    );
    Ok(preview)
}

/// Create every parsed transaction in `store`, one independent call per row.
///
/// Refuses to start while the preview has validation errors. There is no
/// de-duplication: committing the same preview twice creates every row twice.
pub fn commit_import<S: TransactionStore>(
    preview: &ImportPreview,
    store: &mut S,
) -> Result<ImportOutcome, ImportError> {
    if !preview.is_valid() {
        return Err(ImportError::ValidationFailed {
            count: preview.errors.len(),
        });
    }

    let mut outcome = ImportOutcome::default();
    for parsed in &preview.transactions {
        match store.create(parsed.transaction.clone()) {
            Ok(created) => outcome.created.push(created),
            Err(err) => {
                log::warn!("row {}: insert failed: {err}", parsed.row);
                outcome.failures.push(InsertFailure {
                    row: parsed.row,
                    message: err.to_string(),
                });
            }
        }
    }

    log::info!(
        "imported {} transaction(s), {} failed",
        outcome.created.len(),
        outcome.failures.len()
    );
    Ok(outcome)
}
