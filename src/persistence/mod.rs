use crate::assignment::{Assignment, DutyType};
use crate::calendar::Holiday;
use crate::member::{Member, MemberId, NewMember};
use crate::month::MonthWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Caller-supplied records that fail validation.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// Rows already in the store that cannot be decoded or no longer line up.
    #[error("inconsistent store data: {0}")]
    Inconsistent(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an atomic replace of a month's algorithmic assignments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceSummary {
    pub removed: usize,
    pub inserted: usize,
    /// Rows not written because a manual or wheel assignment holds the slot.
    pub ignored: usize,
}

pub trait RosterStore {
    /// All members ordered by id.
    fn list_members(&self) -> StoreResult<Vec<Member>>;

    fn active_members(&self) -> StoreResult<Vec<Member>> {
        Ok(self
            .list_members()?
            .into_iter()
            .filter(|member| member.active)
            .collect())
    }

    fn find_member(&self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.list_members()?.into_iter().find(|member| member.id == id))
    }

    fn add_member(&self, member: NewMember) -> StoreResult<Member>;

    /// Returns false when no member has `id`.
    fn set_member_active(&self, id: MemberId, active: bool) -> StoreResult<bool>;

    /// Removes the member together with their assignments.
    fn remove_member(&self, id: MemberId) -> StoreResult<bool>;
}

pub trait HolidayStore {
    /// All holidays ordered by date.
    fn list_holidays(&self) -> StoreResult<Vec<Holiday>>;

    fn holidays_in(&self, month: MonthWindow) -> StoreResult<Vec<Holiday>> {
        Ok(self
            .list_holidays()?
            .into_iter()
            .filter(|holiday| month.contains(holiday.date))
            .collect())
    }

    /// Insert or relabel; returns the record previously on that date.
    fn put_holiday(&self, holiday: Holiday) -> StoreResult<Option<Holiday>>;

    fn remove_holiday(&self, date: NaiveDate) -> StoreResult<bool>;
}

pub trait AssignmentLedger {
    fn assignments_in(&self, month: MonthWindow) -> StoreResult<Vec<Assignment>>;

    fn assignments_on(&self, date: NaiveDate) -> StoreResult<Vec<Assignment>>;

    fn all_assignments(&self) -> StoreResult<Vec<Assignment>>;

    /// Write one slot, replacing whatever holds it. Returns the replaced row.
    fn upsert_assignment(&self, assignment: Assignment) -> StoreResult<Option<Assignment>>;

    /// Remove `duty` on `date`, or every duty when `None`. Returns the number removed.
    fn remove_assignments(&self, date: NaiveDate, duty: Option<DutyType>) -> StoreResult<usize>;

    /// Atomically delete the month's algorithmic rows and insert `assignments`.
    /// Slots held by manual or wheel rows are left as they are.
    fn replace_algorithmic(
        &self,
        month: MonthWindow,
        assignments: &[Assignment],
    ) -> StoreResult<ReplaceSummary>;
}

/// Everything the scheduler needs from a backing store.
pub trait DutyStore: RosterStore + HolidayStore + AssignmentLedger + Send + Sync {}

impl<T> DutyStore for T where T: RosterStore + HolidayStore + AssignmentLedger + Send + Sync {}

pub(crate) fn validate_replacement(
    month: MonthWindow,
    assignments: &[Assignment],
) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(assignments.len());
    for assignment in assignments {
        if !seen.insert(assignment.slot()) {
            return Err(StoreError::InvalidData(format!(
                "duplicate slot {} in replacement set",
                assignment.slot()
            )));
        }
        if !assignment.origin.is_algorithmic() {
            return Err(StoreError::InvalidData(format!(
                "replace accepts only algorithmic assignments (got {} for {})",
                assignment.origin,
                assignment.slot()
            )));
        }
        if !month.contains(assignment.date) {
            return Err(StoreError::InvalidData(format!(
                "assignment {} lies outside {month}",
                assignment.slot()
            )));
        }
    }
    Ok(())
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    DutySnapshot, export_assignments_to_csv, load_snapshot_from_json, save_snapshot_to_json,
};
pub use memory::MemoryStore;
