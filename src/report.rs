use crate::assignment::{Assignment, DutyType, Origin};
use crate::calendar::{DayKind, DutyCalendar};
use crate::member::{DEFAULT_COLOR, Member, MemberId};
use crate::month::MonthWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An assignment joined with the display fields of its member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentView {
    pub date: NaiveDate,
    pub duty: DutyType,
    pub member_id: MemberId,
    pub member_name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_handle: Option<String>,
    pub origin: Origin,
}

impl AssignmentView {
    fn resolve(assignment: &Assignment, members: &HashMap<MemberId, &Member>) -> Self {
        let member = members.get(&assignment.member_id);
        Self {
            date: assignment.date,
            duty: assignment.duty,
            member_id: assignment.member_id,
            member_name: member.map(|m| m.name.clone()).unwrap_or_default(),
            color: member
                .map(|m| m.color.clone())
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            avatar_emoji: member.and_then(|m| m.avatar_emoji.clone()),
            contact_handle: member.and_then(|m| m.contact_handle.clone()),
            origin: assignment.origin,
        }
    }
}

fn index_members(members: &[Member]) -> HashMap<MemberId, &Member> {
    members.iter().map(|member| (member.id, member)).collect()
}

pub fn resolve_assignments(assignments: &[Assignment], members: &[Member]) -> Vec<AssignmentView> {
    let index = index_members(members);
    assignments
        .iter()
        .map(|assignment| AssignmentView::resolve(assignment, &index))
        .collect()
}

/// What is on duty for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodaySlice {
    pub date: NaiveDate,
    pub primary: Option<AssignmentView>,
    pub secondary: Option<AssignmentView>,
}

pub fn today_slice(date: NaiveDate, assignments: &[Assignment], members: &[Member]) -> TodaySlice {
    let index = index_members(members);
    let pick = |duty: DutyType| {
        assignments
            .iter()
            .find(|a| a.date == date && a.duty == duty)
            .map(|a| AssignmentView::resolve(a, &index))
    };
    TodaySlice {
        date,
        primary: pick(DutyType::Primary),
        secondary: pick(DutyType::Secondary),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub kind: DayKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holiday_label: Option<String>,
    pub primary: Option<AssignmentView>,
    pub secondary: Option<AssignmentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthView {
    pub month: MonthWindow,
    pub days: Vec<DayView>,
}

pub fn month_view(
    month: MonthWindow,
    calendar: &DutyCalendar,
    assignments: &[Assignment],
    members: &[Member],
) -> MonthView {
    let index = index_members(members);
    let mut by_date: BTreeMap<NaiveDate, (Option<AssignmentView>, Option<AssignmentView>)> =
        BTreeMap::new();
    for assignment in assignments.iter().filter(|a| month.contains(a.date)) {
        let entry = by_date.entry(assignment.date).or_default();
        let view = Some(AssignmentView::resolve(assignment, &index));
        match assignment.duty {
            DutyType::Primary => entry.0 = view,
            DutyType::Secondary => entry.1 = view,
        }
    }

    let days = month
        .days()
        .map(|date| {
            let (primary, secondary) = by_date.remove(&date).unwrap_or_default();
            DayView {
                date,
                kind: calendar.day_kind(date),
                holiday_label: calendar.holiday_label(date).map(str::to_string),
                primary,
                secondary,
            }
        })
        .collect();
    MonthView { month, days }
}

/// Per-member totals for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStats {
    pub member_id: MemberId,
    pub name: String,
    pub color: String,
    pub active: bool,
    pub primary_count: u32,
    pub secondary_count: u32,
    pub total_assignments: u32,
}

/// Totals for every member, including members with no assignments, sorted by id.
pub fn member_stats(members: &[Member], assignments: &[Assignment]) -> Vec<MemberStats> {
    let mut counts: HashMap<MemberId, (u32, u32)> = HashMap::new();
    for assignment in assignments {
        let entry = counts.entry(assignment.member_id).or_default();
        match assignment.duty {
            DutyType::Primary => entry.0 += 1,
            DutyType::Secondary => entry.1 += 1,
        }
    }

    let mut stats: Vec<MemberStats> = members
        .iter()
        .map(|member| {
            let (primary_count, secondary_count) =
                counts.get(&member.id).copied().unwrap_or_default();
            MemberStats {
                member_id: member.id,
                name: member.name.clone(),
                color: member.color.clone(),
                active: member.active,
                primary_count,
                secondary_count,
                total_assignments: primary_count + secondary_count,
            }
        })
        .collect();
    stats.sort_by_key(|s| s.member_id);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
    }

    #[test]
    fn stats_include_idle_members() {
        let members = vec![Member::new(2, "B"), Member::new(1, "A")];
        let assignments = vec![
            Assignment::algorithmic(d(1), DutyType::Primary, 1),
            Assignment::algorithmic(d(1), DutyType::Secondary, 1),
            Assignment::new(d(2), DutyType::Primary, 1, Origin::Manual),
        ];
        let stats = member_stats(&members, &assignments);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].member_id, 1);
        assert_eq!(
            (stats[0].primary_count, stats[0].secondary_count, stats[0].total_assignments),
            (2, 1, 3)
        );
        assert_eq!(stats[1].total_assignments, 0);
    }

    #[test]
    fn month_view_marks_weekends_and_holidays() {
        let mut calendar = DutyCalendar::new();
        calendar.toggle_holiday(d(3));
        let month = MonthWindow::containing(d(1)).unwrap();
        let members = vec![Member::new(1, "A")];
        let assignments = vec![Assignment::algorithmic(d(1), DutyType::Primary, 1)];

        let view = month_view(month, &calendar, &assignments, &members);
        assert_eq!(view.days.len(), 30);
        assert_eq!(view.days[0].primary.as_ref().unwrap().member_name, "A");
        assert_eq!(view.days[2].kind, DayKind::Holiday);
        // 2025-09-06 is a Saturday.
        assert_eq!(view.days[5].kind, DayKind::Weekend);
    }
}
