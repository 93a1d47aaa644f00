use super::kind::{Mode, RecordKind};
use chrono::{Days, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Inclusive calendar date range, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ParamsError> {
        if start > end {
            return Err(ParamsError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every date in the range, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.checked_add_days(Days::new(1)))
            .take_while(move |d| *d <= end)
    }

    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Which instruments a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsinSelection {
    /// Exactly these ISINs, normalised and deduplicated.
    Explicit(Vec<String>),
    /// Everything the global endpoints return.
    All,
    /// Enumerate the whole bond universe first, then fetch per ISIN.
    Universe,
}

impl IsinSelection {
    /// Build an explicit selection from raw user input: trims, upper-cases,
    /// drops empty items and repeated ISINs (first occurrence wins).
    pub fn explicit<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut isins: Vec<String> = Vec::new();
        for item in raw {
            let isin = item.as_ref().trim().to_ascii_uppercase();
            if !isin.is_empty() && !isins.contains(&isin) {
                isins.push(isin);
            }
        }
        IsinSelection::Explicit(isins)
    }

    /// Parse a comma-separated list, as given on the command line.
    pub fn from_csv(raw: &str) -> Self {
        Self::explicit(raw.split(','))
    }

    pub fn explicit_isins(&self) -> Option<&[String]> {
        match self {
            IsinSelection::Explicit(isins) => Some(isins),
            _ => None,
        }
    }
}

/// Immutable parameters of one ingestion run for one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub kind: RecordKind,
    pub dates: DateRange,
    pub isins: IsinSelection,
    pub mode: Mode,
}

impl RunParams {
    pub fn new(kind: RecordKind, dates: DateRange, isins: IsinSelection, mode: Mode) -> Self {
        Self { kind, dates, isins, mode }
    }
}
