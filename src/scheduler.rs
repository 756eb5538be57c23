use crate::assignment::{Assignment, DutyType, Origin, sort_assignments};
use crate::calculations::{self, PlanError, SkippedSlot};
use crate::calendar::{DutyCalendar, Holiday};
use crate::member::{Member, MemberId, NewMember};
use crate::month::{MonthParseError, MonthWindow};
use crate::persistence::{DutyStore, ReplaceSummary, StoreError};
use crate::report::{self, AssignmentView, MemberStats, MonthView, TodaySlice};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    InvalidMonth(#[from] MonthParseError),
    #[error("{0}")]
    Input(String),
    #[error("no eligible members: add or activate at least one member before generating")]
    NoEligibleMembers,
    #[error("{0} not found")]
    NotFound(String),
    #[error("store failure: {0}")]
    Dependency(#[source] StoreError),
}

/// Broad classes callers map to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Precondition,
    NotFound,
    Dependency,
}

impl ScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::InvalidMonth(_) | ScheduleError::Input(_) => ErrorKind::Input,
            ScheduleError::NoEligibleMembers => ErrorKind::Precondition,
            ScheduleError::NotFound(_) => ErrorKind::NotFound,
            ScheduleError::Dependency(_) => ErrorKind::Dependency,
        }
    }
}

/// Caller-supplied invalid data maps to `Input`; every other store failure, including rows
/// the store cannot decode, is a `Dependency`.
impl From<StoreError> for ScheduleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => ScheduleError::NotFound(what),
            StoreError::InvalidData(message) => ScheduleError::Input(message),
            other => ScheduleError::Dependency(other),
        }
    }
}

impl From<PlanError> for ScheduleError {
    fn from(value: PlanError) -> Self {
        match value {
            PlanError::NoEligibleMembers => ScheduleError::NoEligibleMembers,
            other => ScheduleError::Input(other.to_string()),
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Response of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub month: MonthWindow,
    pub eligible_days: usize,
    pub primary: Vec<AssignmentView>,
    pub secondary: Vec<AssignmentView>,
    pub skipped: Vec<SkippedSlot>,
    pub primary_counts: BTreeMap<MemberId, u32>,
    pub ledger: ReplaceSummary,
}

impl GenerationResult {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("month={}", self.month),
            format!("days={}", self.eligible_days),
            format!("primary={}", self.primary.len()),
            format!("secondary={}", self.secondary.len()),
        ];
        if !self.skipped.is_empty() {
            parts.push(format!("skipped={}", self.skipped.len()));
        }
        let counts = self
            .primary_counts
            .iter()
            .map(|(id, count)| format!("{id}:{count}"))
            .collect::<Vec<_>>()
            .join(",");
        parts.push(format!("load={counts}"));
        parts.join(", ")
    }
}

/// Entry point for generation and the admin operations around it.
pub struct DutyScheduler {
    store: Arc<dyn DutyStore>,
    month_locks: Mutex<HashMap<MonthWindow, Arc<Mutex<()>>>>,
}

impl DutyScheduler {
    pub fn new(store: Arc<dyn DutyStore>) -> Self {
        Self {
            store,
            month_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn DutyStore> {
        &self.store
    }

    fn month_lock(&self, month: MonthWindow) -> Arc<Mutex<()>> {
        self.month_locks
            .lock()
            .entry(month)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the month's lock entry once no run holds or waits on it.
    fn release_month_lock(&self, month: MonthWindow, lock: Arc<Mutex<()>>) {
        drop(lock);
        let mut locks = self.month_locks.lock();
        if locks
            .get(&month)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&month);
        }
    }

    pub fn calendar_for(&self, month: MonthWindow) -> ScheduleResult<DutyCalendar> {
        Ok(DutyCalendar::with_holidays(self.store.holidays_in(month)?))
    }

    pub fn eligible_days(&self, month: &str) -> ScheduleResult<Vec<NaiveDate>> {
        let month: MonthWindow = month.parse()?;
        Ok(self.calendar_for(month)?.eligible_days(month))
    }

    pub fn generate(&self, month: &str) -> ScheduleResult<GenerationResult> {
        self.generate_with_rng(month, &mut rand::thread_rng())
    }

    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        month: &str,
        rng: &mut R,
    ) -> ScheduleResult<GenerationResult> {
        let month: MonthWindow = month.parse()?;
        self.generate_month(month, rng)
    }

    /// Regenerate the algorithmic assignments of `month`. Runs for the same month are
    /// serialized; the ledger is only written once the whole plan is ready.
    pub fn generate_month<R: Rng + ?Sized>(
        &self,
        month: MonthWindow,
        rng: &mut R,
    ) -> ScheduleResult<GenerationResult> {
        let lock = self.month_lock(month);
        let result = {
            let _guard = lock.lock();
            self.generate_locked(month, rng)
        };
        self.release_month_lock(month, lock);
        result
    }

    fn generate_locked<R: Rng + ?Sized>(
        &self,
        month: MonthWindow,
        rng: &mut R,
    ) -> ScheduleResult<GenerationResult> {
        info!(%month, "generating duty schedule");

        let members = self.store.active_members()?;
        if members.is_empty() {
            warn!(%month, "generation aborted: no active members");
            return Err(ScheduleError::NoEligibleMembers);
        }

        let calendar = self.calendar_for(month)?;
        let eligible = calendar.eligible_days(month);
        let existing = self.store.assignments_in(month)?;
        debug!(
            %month,
            members = members.len(),
            days = eligible.len(),
            existing = existing.len(),
            "planning month"
        );

        let plan = calculations::plan_duties(&eligible, &members, &existing, rng)?;
        let ledger = self
            .store
            .replace_algorithmic(month, &plan.assignments())
            .inspect_err(|err| warn!(%month, error = %err, "ledger replace failed"))
            .map_err(ScheduleError::Dependency)?;

        if !plan.skipped.is_empty() {
            info!(%month, skipped = plan.skipped.len(), "kept manual assignments in place");
        }
        info!(
            %month,
            primary = plan.primary.len(),
            secondary = plan.secondary.len(),
            removed = ledger.removed,
            spread = plan.primary_spread(),
            "duty schedule generated"
        );

        let all_members = self.store.list_members()?;
        Ok(GenerationResult {
            month,
            eligible_days: eligible.len(),
            primary: report::resolve_assignments(&plan.primary, &all_members),
            secondary: report::resolve_assignments(&plan.secondary, &all_members),
            skipped: plan.skipped,
            primary_counts: plan.primary_counts,
            ledger,
        })
    }

    pub fn list_members(&self) -> ScheduleResult<Vec<Member>> {
        Ok(self.store.list_members()?)
    }

    pub fn add_member(&self, member: NewMember) -> ScheduleResult<Member> {
        let member = self.store.add_member(member)?;
        info!(member_id = member.id, name = %member.name, "member added");
        Ok(member)
    }

    pub fn set_member_active(&self, id: MemberId, active: bool) -> ScheduleResult<Member> {
        if !self.store.set_member_active(id, active)? {
            return Err(ScheduleError::NotFound(format!("member {id}")));
        }
        info!(member_id = id, active, "member activity changed");
        self.store
            .find_member(id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("member {id}")))
    }

    pub fn toggle_member(&self, id: MemberId) -> ScheduleResult<Member> {
        let member = self
            .store
            .find_member(id)?
            .ok_or_else(|| ScheduleError::NotFound(format!("member {id}")))?;
        self.set_member_active(id, !member.active)
    }

    pub fn remove_member(&self, id: MemberId) -> ScheduleResult<()> {
        if !self.store.remove_member(id)? {
            return Err(ScheduleError::NotFound(format!("member {id}")));
        }
        info!(member_id = id, "member removed");
        Ok(())
    }

    pub fn holidays(&self, month: Option<&str>) -> ScheduleResult<Vec<Holiday>> {
        match month {
            Some(month) => Ok(self.store.holidays_in(month.parse()?)?),
            None => Ok(self.store.list_holidays()?),
        }
    }

    pub fn add_holiday(&self, date: NaiveDate, label: &str) -> ScheduleResult<Holiday> {
        let holiday = Holiday::new(date, label);
        self.store.put_holiday(holiday.clone())?;
        info!(%date, label = %holiday.label, "holiday set");
        Ok(holiday)
    }

    pub fn remove_holiday(&self, date: NaiveDate) -> ScheduleResult<()> {
        if !self.store.remove_holiday(date)? {
            return Err(ScheduleError::NotFound(format!("holiday on {date}")));
        }
        info!(%date, "holiday removed");
        Ok(())
    }

    /// Returns true when `date` is a holiday afterwards.
    pub fn toggle_holiday(&self, date: NaiveDate) -> ScheduleResult<bool> {
        if self.store.remove_holiday(date)? {
            info!(%date, "holiday removed");
            return Ok(false);
        }
        self.add_holiday(date, "")?;
        Ok(true)
    }

    /// Put one member on one slot by hand. Overwrites whatever holds the slot.
    pub fn assign(
        &self,
        date: NaiveDate,
        duty: DutyType,
        member_id: MemberId,
        origin: Origin,
    ) -> ScheduleResult<AssignmentView> {
        if origin.is_algorithmic() {
            return Err(ScheduleError::Input(
                "manual assignments must use origin manual or wheel".into(),
            ));
        }
        let assignment = Assignment::new(date, duty, member_id, origin);
        let previous = self.store.upsert_assignment(assignment.clone())?;
        info!(
            %date,
            %duty,
            member_id,
            %origin,
            replaced = previous.is_some(),
            "assignment set"
        );
        let members = self.store.list_members()?;
        let mut views = report::resolve_assignments(&[assignment], &members);
        views
            .pop()
            .ok_or_else(|| ScheduleError::Input("assignment could not be resolved".into()))
    }

    pub fn unassign(&self, date: NaiveDate, duty: Option<DutyType>) -> ScheduleResult<usize> {
        let removed = self.store.remove_assignments(date, duty)?;
        info!(%date, duty = ?duty, removed, "assignments removed");
        Ok(removed)
    }

    pub fn assignments_in(&self, month: &str) -> ScheduleResult<Vec<AssignmentView>> {
        let month: MonthWindow = month.parse()?;
        let mut assignments = self.store.assignments_in(month)?;
        sort_assignments(&mut assignments);
        let members = self.store.list_members()?;
        Ok(report::resolve_assignments(&assignments, &members))
    }

    pub fn month_view(&self, month: &str) -> ScheduleResult<MonthView> {
        let month: MonthWindow = month.parse()?;
        let calendar = self.calendar_for(month)?;
        let assignments = self.store.assignments_in(month)?;
        let members = self.store.list_members()?;
        Ok(report::month_view(month, &calendar, &assignments, &members))
    }

    pub fn today(&self, date: NaiveDate) -> ScheduleResult<TodaySlice> {
        let assignments = self.store.assignments_on(date)?;
        let members = self.store.list_members()?;
        Ok(report::today_slice(date, &assignments, &members))
    }

    pub fn member_stats(&self, month: Option<&str>) -> ScheduleResult<Vec<MemberStats>> {
        let assignments = match month {
            Some(month) => self.store.assignments_in(month.parse()?)?,
            None => self.store.all_assignments()?,
        };
        let members = self.store.list_members()?;
        Ok(report::member_stats(&members, &assignments))
    }
}
