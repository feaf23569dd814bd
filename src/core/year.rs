use chrono::{Datelike, NaiveDate};

/// Tax year, which for this ledger is the calendar year (1 January to 31 December).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

impl TaxYear {
    pub fn from_date(date: NaiveDate) -> Self {
        TaxYear(date.year())
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.0
    }

    pub fn display(&self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Year-to-date window: 1 January of the `as_of` year up to and including `as_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YtdWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl YtdWindow {
    pub fn ending(as_of: NaiveDate) -> Self {
        YtdWindow {
            start: TaxYear::from_date(as_of).start_date(),
            end: as_of,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
