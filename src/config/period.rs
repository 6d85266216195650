//! Reporting period selection.
//!
//! A report covers an inclusive date range. It is given either as a calendar month
//! (with an optional year, `0` meaning the current one) or as explicit `from`/`to`
//! dates. Both forms are validated here, before any request is sent.

use crate::core::ReportError;
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;

/// Inclusive date range covered by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    from: NaiveDate,
    to: NaiveDate,
}

impl ReportPeriod {
    /// Build a period from explicit start and end dates.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidPeriod`] when `from` lies after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ReportError> {
        if from > to {
            return Err(ReportError::InvalidPeriod {
                reason: format!("The start date {from} lies after the end date {to}"),
            });
        }
        Ok(Self {
            from,
            to,
        })
    }

    /// Build the period spanning a whole calendar month.
    ///
    /// `year == 0` selects the current year.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use worktable::config::ReportPeriod;
    ///
    /// let period = ReportPeriod::month(2024, 2).unwrap();
    /// assert_eq!(period.from_date().to_string(), "2024-02-01");
    /// assert_eq!(period.to_date().to_string(), "2024-02-29");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidPeriod`] for a month outside `1..=12` or a year
    /// outside `0..=9999`.
    pub fn month(year: i32, month: u32) -> Result<Self, ReportError> {
        if !(1..=12).contains(&month) {
            return Err(ReportError::InvalidPeriod {
                reason: "The month must be between 1 and 12".to_string(),
            });
        }
        if !(0..=9999).contains(&year) {
            return Err(ReportError::InvalidPeriod {
                reason: "The year must be between 0 and 9999".to_string(),
            });
        }

        let year = if year == 0 {
            Local::now().year()
        } else {
            year
        };

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ReportError::InvalidPeriod {
                reason: format!("{year}-{month:02} is not a valid month"),
            }
        })?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| ReportError::InvalidPeriod {
                reason: format!("{year}-{month:02} has no last day"),
            })?;

        Self::new(first, last)
    }

    /// Parse a period from `YYYY-MM-DD` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidPeriod`] when either date fails to parse or the
    /// range is reversed.
    pub fn parse(from: &str, to: &str) -> Result<Self, ReportError> {
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        Self::new(from, to)
    }

    /// First day of the period.
    #[must_use]
    pub const fn from_date(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the period (inclusive).
    #[must_use]
    pub const fn to_date(&self) -> NaiveDate {
        self.to
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}", self.from, self.to)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| ReportError::InvalidPeriod {
        reason: format!("`{value}` is not a YYYY-MM-DD date: {e}"),
    })
}
