//! Calendar quarters and the canonical quarter index.
//!
//! Every per-company series is re-indexed onto a fixed, gap-free sequence of
//! calendar quarters spanning the configured year range.

use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar quarter, e.g. `2013Q2`.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Create a quarter. Returns `None` unless `quarter` is in `1..=4`.
    pub const fn new(year: i32, quarter: u8) -> Option<Self> {
        if quarter >= 1 && quarter <= 4 {
            Some(Self { year, quarter })
        } else {
            None
        }
    }

    /// The calendar quarter containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }

    /// Calendar year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Quarter number within the year (1-4).
    pub const fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Number of quarters since year 0, used for index arithmetic.
    const fn ordinal(&self) -> i64 {
        self.year as i64 * 4 + (self.quarter as i64 - 1)
    }

    /// The quarter immediately after this one.
    pub const fn next(&self) -> Self {
        if self.quarter == 4 {
            Self {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DataError::InvalidQuarter(s.to_string());
        let (year, quarter) = s.trim().split_once(['Q', 'q']).ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let quarter: u8 = quarter.parse().map_err(|_| invalid())?;
        Self::new(year, quarter).ok_or_else(invalid)
    }
}

/// Inclusive range of calendar years covered by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    /// First year (default: 2000)
    pub start: i32,
    /// Last year (default: 2024)
    pub end: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start: 2000,
            end: 2024,
        }
    }
}

impl YearRange {
    /// Whether `year` falls inside the range.
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Number of quarters the range spans.
    pub const fn expected_quarters(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            ((self.end - self.start + 1) * 4) as usize
        }
    }
}

/// Ordered, gap-free sequence of calendar quarters.
///
/// Invariant: strictly increasing, consecutive, and of length
/// `YearRange::expected_quarters` (100 for 2000-2024).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalQuarterIndex {
    quarters: Vec<Quarter>,
}

impl CanonicalQuarterIndex {
    /// Build the index from Q1 of `range.start` through Q4 of `range.end`.
    pub fn new(range: &YearRange) -> Result<Self> {
        if range.end < range.start {
            return Err(DataError::InvalidYearRange {
                start: range.start,
                end: range.end,
            });
        }

        let mut quarters = Vec::with_capacity(range.expected_quarters());
        let mut current = Quarter {
            year: range.start,
            quarter: 1,
        };
        while current.year <= range.end {
            quarters.push(current);
            current = current.next();
        }

        Ok(Self { quarters })
    }

    /// Number of quarters in the index.
    pub fn len(&self) -> usize {
        self.quarters.len()
    }

    /// Whether the index is empty (never true for a valid range).
    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }

    /// The quarters, in order.
    pub fn quarters(&self) -> &[Quarter] {
        &self.quarters
    }

    /// Iterate over the quarters in order.
    pub fn iter(&self) -> impl Iterator<Item = &Quarter> {
        self.quarters.iter()
    }

    /// Position of `quarter` in the index, if it is covered.
    pub fn position(&self, quarter: &Quarter) -> Option<usize> {
        let first = self.quarters.first()?;
        let offset = quarter.ordinal() - first.ordinal();
        usize::try_from(offset).ok().filter(|&i| i < self.quarters.len())
    }

    /// Whether `quarter` is covered by the index.
    pub fn contains(&self, quarter: &Quarter) -> bool {
        self.position(quarter).is_some()
    }
}
