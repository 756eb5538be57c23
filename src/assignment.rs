use crate::member::MemberId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyType {
    /// The daily rotating chore, one member per eligible day.
    Primary,
    /// Every other eligible day, bundled with that day's primary duty.
    Secondary,
}

impl DutyType {
    pub const ALL: [DutyType; 2] = [DutyType::Primary, DutyType::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            DutyType::Primary => "primary",
            DutyType::Secondary => "secondary",
        }
    }
}

impl fmt::Display for DutyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(DutyType::Primary),
            "secondary" => Ok(DutyType::Secondary),
            other => Err(UnknownVariant {
                kind: "duty type",
                value: other.to_string(),
            }),
        }
    }
}

/// Who created an assignment. Only `Algorithmic` rows are replaced by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Algorithmic,
    Manual,
    Wheel,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Algorithmic => "algorithmic",
            Origin::Manual => "manual",
            Origin::Wheel => "wheel",
        }
    }

    pub fn is_algorithmic(&self) -> bool {
        matches!(self, Origin::Algorithmic)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "algorithmic" => Ok(Origin::Algorithmic),
            "manual" => Ok(Origin::Manual),
            "wheel" => Ok(Origin::Wheel),
            other => Err(UnknownVariant {
                kind: "origin",
                value: other.to_string(),
            }),
        }
    }
}

/// The upsert key of the ledger: at most one assignment per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub duty: DutyType,
}

impl SlotKey {
    pub fn new(date: NaiveDate, duty: DutyType) -> Self {
        Self { date, duty }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.duty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub date: NaiveDate,
    pub duty: DutyType,
    pub member_id: MemberId,
    pub origin: Origin,
}

impl Assignment {
    pub fn new(date: NaiveDate, duty: DutyType, member_id: MemberId, origin: Origin) -> Self {
        Self {
            date,
            duty,
            member_id,
            origin,
        }
    }

    pub fn algorithmic(date: NaiveDate, duty: DutyType, member_id: MemberId) -> Self {
        Self::new(date, duty, member_id, Origin::Algorithmic)
    }

    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.date, self.duty)
    }
}

/// Sort by date, primary before secondary.
pub fn sort_assignments(assignments: &mut [Assignment]) {
    assignments.sort_by_key(Assignment::slot);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_forms_parse_case_insensitively() {
        assert_eq!("Primary".parse::<DutyType>(), Ok(DutyType::Primary));
        assert_eq!(" secondary".parse::<DutyType>(), Ok(DutyType::Secondary));
        assert_eq!("WHEEL".parse::<Origin>(), Ok(Origin::Wheel));
        let err = "vileda".parse::<DutyType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown duty type 'vileda'");
    }

    #[test]
    fn slots_order_primary_before_secondary() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut rows = vec![
            Assignment::algorithmic(day, DutyType::Secondary, 1),
            Assignment::algorithmic(day.pred_opt().unwrap(), DutyType::Secondary, 2),
            Assignment::algorithmic(day, DutyType::Primary, 1),
        ];
        sort_assignments(&mut rows);
        assert_eq!(rows[0].date, day.pred_opt().unwrap());
        assert_eq!(rows[1].duty, DutyType::Primary);
        assert_eq!(rows[2].duty, DutyType::Secondary);
    }
}
