//! Paginated plain-text report built from a list of (category, amount, type) rows.

use super::currency::{format_amount, Currency};
use super::summary::CategoryTotal;
use super::transaction::TransactionType;
use rust_decimal::Decimal;

/// Header lines (title, column heading, rule) plus the footer line.
const PAGE_CHROME: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub category: String,
    pub amount: Decimal,
    pub kind: TransactionType,
}

impl From<&CategoryTotal> for ReportRow {
    fn from(total: &CategoryTotal) -> Self {
        ReportRow {
            category: total.category.clone(),
            amount: total.total,
            kind: total.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// Lay out `rows` on pages of `page_height` lines. Rows never split across
    /// pages and every page repeats the title and column heading.
    pub fn layout(title: &str, rows: &[ReportRow], currency: Currency, page_height: usize) -> Self {
        let per_page = page_height.saturating_sub(PAGE_CHROME).max(1);
        let formatted: Vec<(String, String, &str)> = rows
            .iter()
            .map(|r| {
                let amount = match r.kind {
                    TransactionType::Income => format_amount(r.amount, currency),
                    TransactionType::Expense => format_amount(-r.amount, currency),
                };
                (r.category.clone(), amount, r.kind.as_str())
            })
            .collect();

        let category_width = formatted
            .iter()
            .map(|(c, _, _)| c.chars().count())
            .chain(std::iter::once("Category".len()))
            .max()
            .unwrap_or(0);
        let amount_width = formatted
            .iter()
            .map(|(_, a, _)| a.chars().count())
            .chain(std::iter::once("Amount".len()))
            .max()
            .unwrap_or(0);

        let chunks: Vec<_> = if formatted.is_empty() {
            vec![&formatted[..]]
        } else {
            formatted.chunks(per_page).collect()
        };
        let total = chunks.len();

        let pages = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut lines = Vec::with_capacity(chunk.len() + PAGE_CHROME);
                lines.push(title.to_string());
                lines.push(format!(
                    "{:<cw$}  {:>aw$}  Type",
                    "Category",
                    "Amount",
                    cw = category_width,
                    aw = amount_width
                ));
                lines.push("-".repeat(category_width + amount_width + 10));
                for (category, amount, kind) in chunk {
                    lines.push(format!(
                        "{:<cw$}  {:>aw$}  {}",
                        category,
                        amount,
                        kind,
                        cw = category_width,
                        aw = amount_width
                    ));
                }
                lines.push(format!("Page {} of {}", i + 1, total));
                Page { lines }
            })
            .collect();

        Document {
            title: title.to_string(),
            pages,
        }
    }

    /// Pages separated by form feeds.
    pub fn render(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\u{000C}\n")
    }
}
