use crate::month::MonthWindow;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_HOLIDAY_LABEL: &str = "Holiday";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub label: String,
}

impl Holiday {
    pub fn new(date: NaiveDate, label: impl Into<String>) -> Self {
        let label = label.into();
        let label = if label.trim().is_empty() {
            DEFAULT_HOLIDAY_LABEL.to_string()
        } else {
            label.trim().to_string()
        };
        Self { date, label }
    }
}

/// How a single day of a month is treated by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Eligible,
    Weekend,
    Holiday,
}

/// Weekends plus the admin-curated holiday set.
#[derive(Debug, Clone, PartialEq)]
pub struct DutyCalendar {
    holidays: BTreeMap<NaiveDate, String>,
    non_working_days: HashSet<Weekday>,
}

impl Default for DutyCalendar {
    fn default() -> Self {
        Self {
            holidays: BTreeMap::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl DutyCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays<I>(holidays: I) -> Self
    where
        I: IntoIterator<Item = Holiday>,
    {
        let mut calendar = Self::default();
        for holiday in holidays {
            calendar.add_holiday(holiday);
        }
        calendar
    }

    /// Insert or relabel the holiday on `holiday.date`, returning the previous label.
    pub fn add_holiday(&mut self, holiday: Holiday) -> Option<String> {
        self.holidays.insert(holiday.date, holiday.label)
    }

    pub fn remove_holiday(&mut self, date: NaiveDate) -> Option<Holiday> {
        self.holidays
            .remove(&date)
            .map(|label| Holiday { date, label })
    }

    /// Flip a date between holiday and working day. Returns true when the date is now a holiday.
    pub fn toggle_holiday(&mut self, date: NaiveDate) -> bool {
        if self.holidays.remove(&date).is_some() {
            false
        } else {
            self.holidays.insert(date, DEFAULT_HOLIDAY_LABEL.to_string());
            true
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    pub fn holiday_label(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.non_working_days.contains(&date.weekday())
    }

    /// Check if a date takes part in automatic assignment
    pub fn is_eligible(&self, date: NaiveDate) -> bool {
        !self.is_holiday(date) && !self.is_weekend(date)
    }

    pub fn day_kind(&self, date: NaiveDate) -> DayKind {
        if self.is_holiday(date) {
            DayKind::Holiday
        } else if self.is_weekend(date) {
            DayKind::Weekend
        } else {
            DayKind::Eligible
        }
    }

    pub fn holidays(&self) -> Vec<Holiday> {
        self.holidays
            .iter()
            .map(|(date, label)| Holiday {
                date: *date,
                label: label.clone(),
            })
            .collect()
    }

    pub fn holidays_in(&self, month: MonthWindow) -> Vec<Holiday> {
        self.holidays
            .range(month.first_day()..=month.last_day())
            .map(|(date, label)| Holiday {
                date: *date,
                label: label.clone(),
            })
            .collect()
    }

    /// Eligible dates of the month in ascending order. The position of a date in this
    /// sequence decides whether it carries the secondary duty.
    pub fn eligible_days(&self, month: MonthWindow) -> Vec<NaiveDate> {
        month.days().filter(|date| self.is_eligible(*date)).collect()
    }

    pub fn count_eligible_days(&self, month: MonthWindow) -> usize {
        month.days().filter(|date| self.is_eligible(*date)).count()
    }
}
