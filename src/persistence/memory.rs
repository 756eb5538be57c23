use super::{
    AssignmentLedger, HolidayStore, ReplaceSummary, RosterStore, StoreError, StoreResult,
    validate_replacement,
};
use crate::assignment::{Assignment, DutyType, SlotKey};
use crate::calendar::{DutyCalendar, Holiday};
use crate::member::{Member, MemberId, NewMember};
use crate::month::MonthWindow;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryState {
    members: BTreeMap<MemberId, Member>,
    calendar: DutyCalendar,
    assignments: BTreeMap<SlotKey, Assignment>,
    last_member_id: MemberId,
}

impl MemoryState {
    // Ids are never reused, even after the highest member is removed.
    fn next_member_id(&mut self) -> MemberId {
        self.last_member_id += 1;
        self.last_member_id
    }

    fn month_range(month: MonthWindow) -> std::ops::RangeInclusive<SlotKey> {
        SlotKey::new(month.first_day(), DutyType::Primary)
            ..=SlotKey::new(month.last_day(), DutyType::Secondary)
    }
}

/// Process-local store. Every operation runs under one lock, so a replace is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing records, checking the same invariants the
    /// mutating operations enforce.
    pub fn from_parts(
        members: Vec<Member>,
        holidays: Vec<Holiday>,
        assignments: Vec<Assignment>,
    ) -> StoreResult<Self> {
        crate::member::validate_member_collection(&members)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        let members: BTreeMap<MemberId, Member> =
            members.into_iter().map(|member| (member.id, member)).collect();

        let mut calendar = DutyCalendar::new();
        for holiday in holidays {
            let date = holiday.date;
            if calendar.add_holiday(holiday).is_some() {
                return Err(StoreError::InvalidData(format!(
                    "duplicate holiday on {date}"
                )));
            }
        }

        let mut by_slot = BTreeMap::new();
        for assignment in assignments {
            if !members.contains_key(&assignment.member_id) {
                return Err(StoreError::InvalidData(format!(
                    "assignment {} references unknown member {}",
                    assignment.slot(),
                    assignment.member_id
                )));
            }
            let slot = assignment.slot();
            if by_slot.insert(slot, assignment).is_some() {
                return Err(StoreError::InvalidData(format!("duplicate slot {slot}")));
            }
        }

        let last_member_id = members.keys().next_back().copied().unwrap_or(0);
        Ok(Self {
            state: RwLock::new(MemoryState {
                members,
                calendar,
                assignments: by_slot,
                last_member_id,
            }),
        })
    }

    /// Copy of the current holiday calendar.
    pub fn calendar(&self) -> DutyCalendar {
        self.state.read().calendar.clone()
    }
}

impl RosterStore for MemoryStore {
    fn list_members(&self) -> StoreResult<Vec<Member>> {
        Ok(self.state.read().members.values().cloned().collect())
    }

    fn find_member(&self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.state.read().members.get(&id).cloned())
    }

    fn add_member(&self, member: NewMember) -> StoreResult<Member> {
        let member = member
            .normalized()
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;
        let mut state = self.state.write();
        let id = state.next_member_id();
        let member = member.into_member(id);
        state.members.insert(member.id, member.clone());
        Ok(member)
    }

    fn set_member_active(&self, id: MemberId, active: bool) -> StoreResult<bool> {
        let mut state = self.state.write();
        match state.members.get_mut(&id) {
            Some(member) => {
                member.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_member(&self, id: MemberId) -> StoreResult<bool> {
        let mut state = self.state.write();
        if state.members.remove(&id).is_none() {
            return Ok(false);
        }
        state
            .assignments
            .retain(|_, assignment| assignment.member_id != id);
        Ok(true)
    }
}

impl HolidayStore for MemoryStore {
    fn list_holidays(&self) -> StoreResult<Vec<Holiday>> {
        Ok(self.state.read().calendar.holidays())
    }

    fn holidays_in(&self, month: MonthWindow) -> StoreResult<Vec<Holiday>> {
        Ok(self.state.read().calendar.holidays_in(month))
    }

    fn put_holiday(&self, holiday: Holiday) -> StoreResult<Option<Holiday>> {
        let date = holiday.date;
        let previous = self.state.write().calendar.add_holiday(holiday);
        Ok(previous.map(|label| Holiday { date, label }))
    }

    fn remove_holiday(&self, date: NaiveDate) -> StoreResult<bool> {
        Ok(self.state.write().calendar.remove_holiday(date).is_some())
    }
}

impl AssignmentLedger for MemoryStore {
    fn assignments_in(&self, month: MonthWindow) -> StoreResult<Vec<Assignment>> {
        let state = self.state.read();
        Ok(state
            .assignments
            .range(MemoryState::month_range(month))
            .map(|(_, assignment)| assignment.clone())
            .collect())
    }

    fn assignments_on(&self, date: NaiveDate) -> StoreResult<Vec<Assignment>> {
        let state = self.state.read();
        Ok(DutyType::ALL
            .iter()
            .filter_map(|duty| state.assignments.get(&SlotKey::new(date, *duty)))
            .cloned()
            .collect())
    }

    fn all_assignments(&self) -> StoreResult<Vec<Assignment>> {
        Ok(self.state.read().assignments.values().cloned().collect())
    }

    fn upsert_assignment(&self, assignment: Assignment) -> StoreResult<Option<Assignment>> {
        let mut state = self.state.write();
        if !state.members.contains_key(&assignment.member_id) {
            return Err(StoreError::NotFound(format!(
                "member {}",
                assignment.member_id
            )));
        }
        Ok(state.assignments.insert(assignment.slot(), assignment))
    }

    fn remove_assignments(&self, date: NaiveDate, duty: Option<DutyType>) -> StoreResult<usize> {
        let mut state = self.state.write();
        let duties: Vec<DutyType> = match duty {
            Some(duty) => vec![duty],
            None => DutyType::ALL.to_vec(),
        };
        Ok(duties
            .into_iter()
            .filter(|duty| state.assignments.remove(&SlotKey::new(date, *duty)).is_some())
            .count())
    }

    fn replace_algorithmic(
        &self,
        month: MonthWindow,
        assignments: &[Assignment],
    ) -> StoreResult<ReplaceSummary> {
        validate_replacement(month, assignments)?;
        let mut state = self.state.write();
        if let Some(unknown) = assignments
            .iter()
            .find(|assignment| !state.members.contains_key(&assignment.member_id))
        {
            return Err(StoreError::Inconsistent(format!(
                "assignment {} references unknown member {}",
                unknown.slot(),
                unknown.member_id
            )));
        }

        let stale: Vec<SlotKey> = state
            .assignments
            .range(MemoryState::month_range(month))
            .filter(|(_, assignment)| assignment.origin.is_algorithmic())
            .map(|(slot, _)| *slot)
            .collect();
        for slot in &stale {
            state.assignments.remove(slot);
        }

        let mut summary = ReplaceSummary {
            removed: stale.len(),
            ..ReplaceSummary::default()
        };
        for assignment in assignments {
            let slot = assignment.slot();
            if state.assignments.contains_key(&slot) {
                summary.ignored += 1;
                continue;
            }
            state.assignments.insert(slot, assignment.clone());
            summary.inserted += 1;
        }
        Ok(summary)
    }
}
