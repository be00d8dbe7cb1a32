use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{BudgetError, Result};

use super::transaction::calendar_date;

/// Inclusive calendar interval over which income, spend, and savings are measured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Period {
    #[serde(with = "calendar_date")]
    pub start: NaiveDate,
    #[serde(with = "calendar_date")]
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(BudgetError::InvalidPeriod(format!(
                "end {} precedes start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// The calendar month that contains `date`.
    pub fn month_containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = first_of_next_month(start) - Duration::days(1);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The month immediately before this period's start month.
    pub fn previous_month(&self) -> Self {
        Self::month_containing(self.start - Duration::days(1))
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}
