//! Processing-day handling for daily Level 3 products.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AerosolError, AerosolResult};

/// Epoch of the output `Time` coordinate ("days since 1990-01-01").
pub const TIME_EPOCH: (i32, u32, u32) = (1990, 1, 1);

/// One UTC calendar day of observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessingDay(NaiveDate);

impl ProcessingDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Create from a year and a 1-based day of year.
    pub fn from_year_doy(year: i32, doy: u32) -> AerosolResult<Self> {
        NaiveDate::from_yo_opt(year, doy)
            .map(Self)
            .ok_or_else(|| AerosolError::InvalidDate(format!("{}{:03}", year, doy)))
    }

    /// Parse `YYYYMMDD` or `YYYYDDD`.
    pub fn parse(s: &str) -> AerosolResult<Self> {
        let s = s.trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(AerosolError::InvalidDate(s.to_string()));
        }

        match s.len() {
            8 => NaiveDate::parse_from_str(s, "%Y%m%d")
                .map(Self)
                .map_err(|_| AerosolError::InvalidDate(s.to_string())),
            7 => {
                let year: i32 = s[..4]
                    .parse()
                    .map_err(|_| AerosolError::InvalidDate(s.to_string()))?;
                let doy: u32 = s[4..]
                    .parse()
                    .map_err(|_| AerosolError::InvalidDate(s.to_string()))?;
                Self::from_year_doy(year, doy)
            }
            _ => Err(AerosolError::InvalidDate(s.to_string())),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// 1-based day of year.
    pub fn day_of_year(&self) -> u32 {
        self.0.ordinal()
    }

    /// `YYYYDDD`, the form used in archive paths and output file names.
    pub fn year_doy(&self) -> String {
        format!("{}{:03}", self.year(), self.day_of_year())
    }

    /// `YYYYMMDD`.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// `YYYY-MM-DD`.
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Whole days since 1990-01-01.
    pub fn days_since_epoch(&self) -> i32 {
        let (y, m, d) = TIME_EPOCH;
        NaiveDate::from_ymd_opt(y, m, d)
            .map(|epoch| (self.0 - epoch).num_days() as i32)
            .unwrap_or(0)
    }

    /// The next calendar day.
    pub fn succ(&self) -> Self {
        Self(self.0 + Duration::days(1))
    }
}

impl std::fmt::Display for ProcessingDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.year_doy())
    }
}

/// An inclusive range of processing days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: ProcessingDay,
    pub end: ProcessingDay,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: ProcessingDay, end: ProcessingDay) -> AerosolResult<Self> {
        if start > end {
            return Err(AerosolError::InvalidDate(format!(
                "start date {} is after end date {}",
                start.iso(),
                end.iso()
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends with [`ProcessingDay::parse`].
    pub fn parse(start: &str, end: &str) -> AerosolResult<Self> {
        Self::new(ProcessingDay::parse(start)?, ProcessingDay::parse(end)?)
    }

    /// Every day from start to end, inclusive.
    pub fn days(&self) -> Vec<ProcessingDay> {
        let mut days = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            days.push(current);
            current = current.succ();
        }
        days
    }

    pub fn len(&self) -> usize {
        ((self.end.date() - self.start.date()).num_days() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
