use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthParseError {
    #[error("month is required (YYYY-MM)")]
    Missing,
    #[error("malformed month '{0}' (expected YYYY-MM)")]
    Malformed(String),
    #[error("month {month} is out of range in '{input}' (expected 1-12)")]
    OutOfRange { input: String, month: u32 },
    #[error("year {year} is out of range (expected {MIN_YEAR}-{MAX_YEAR})")]
    YearOutOfRange { year: i32 },
}

pub const MIN_YEAR: i32 = 0;
pub const MAX_YEAR: i32 = 9999;

/// A calendar month, the unit of generation. The year is always within
/// `MIN_YEAR..=MAX_YEAR`, so every day of the month is a valid date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthWindow {
    year: i32,
    month: u32,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        let window = Self { year, month };
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::OutOfRange {
                input: window.to_string(),
                month,
            });
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(MonthParseError::YearOutOfRange { year });
        }
        Ok(window)
    }

    pub fn containing(date: NaiveDate) -> Result<Self, MonthParseError> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("month window validated on construction")
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day() + Duration::days(i64::from(self.day_count()) - 1)
    }

    /// The following month, or `None` past `MAX_YEAR`.
    pub fn next(&self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year + 1, 1).ok()
        } else {
            Self::new(self.year, self.month + 1).ok()
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn day_count(&self) -> u32 {
        match self.month {
            2 if is_leap_year(self.year) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Every calendar day of the month, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first_day()
            .iter_days()
            .take(self.day_count() as usize)
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthWindow {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(MonthParseError::Missing);
        }
        let malformed = || MonthParseError::Malformed(input.to_string());

        let (year_s, month_s) = input.split_once('-').ok_or_else(malformed)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if year_s.len() != 4 || !all_digits(year_s) || month_s.len() > 2 || !all_digits(month_s) {
            return Err(malformed());
        }

        let year: i32 = year_s.parse().map_err(|_| malformed())?;
        let month: u32 = month_s.parse().map_err(|_| malformed())?;
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::OutOfRange {
                input: input.to_string(),
                month,
            });
        }
        Self::new(year, month)
    }
}

impl Serialize for MonthWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthWindow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
