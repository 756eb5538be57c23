pub mod balance_pass;
pub mod rotation_pass;

use crate::assignment::{Assignment, DutyType, Origin, SlotKey, sort_assignments};
use crate::member::{Member, MemberId};
use balance_pass::BalancePass;
use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use rotation_pass::RotationPass;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no eligible members: at least one active member is required")]
    NoEligibleMembers,
    #[error("rotation order must be a permutation of the active roster")]
    RotationMismatch,
}

/// A slot generation left alone because a manual or wheel assignment owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSlot {
    pub date: NaiveDate,
    pub duty: DutyType,
    pub occupied_by: MemberId,
    pub origin: Origin,
    /// Member the generator would have picked.
    pub planned_member: MemberId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyPlan {
    pub primary: Vec<Assignment>,
    pub secondary: Vec<Assignment>,
    pub skipped: Vec<SkippedSlot>,
    /// Running primary-duty count per active member after both passes.
    pub primary_counts: BTreeMap<MemberId, u32>,
}

impl DutyPlan {
    fn seeded(roster: &[Member], preserved: &[Assignment]) -> Self {
        let mut primary_counts: BTreeMap<MemberId, u32> =
            roster.iter().map(|member| (member.id, 0)).collect();
        for assignment in preserved {
            if assignment.origin.is_algorithmic() || assignment.duty != DutyType::Primary {
                continue;
            }
            if let Some(count) = primary_counts.get_mut(&assignment.member_id) {
                *count += 1;
            }
        }
        Self {
            primary_counts,
            ..Self::default()
        }
    }

    pub(crate) fn bump(&mut self, member_id: MemberId) {
        *self.primary_counts.entry(member_id).or_insert(0) += 1;
    }

    pub fn count_for(&self, member_id: MemberId) -> u32 {
        self.primary_counts.get(&member_id).copied().unwrap_or(0)
    }

    /// Every planned assignment, sorted by slot.
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut all: Vec<Assignment> = self
            .primary
            .iter()
            .chain(self.secondary.iter())
            .cloned()
            .collect();
        sort_assignments(&mut all);
        all
    }

    /// Largest difference in primary counts between any two active members.
    pub fn primary_spread(&self) -> u32 {
        let max = self.primary_counts.values().max().copied().unwrap_or(0);
        let min = self.primary_counts.values().min().copied().unwrap_or(0);
        max - min
    }
}

/// Slots a generation run must not touch, keyed for lookup.
pub(crate) type OccupiedSlots = HashMap<SlotKey, Assignment>;

fn occupied_slots(preserved: &[Assignment]) -> OccupiedSlots {
    preserved
        .iter()
        .filter(|assignment| !assignment.origin.is_algorithmic())
        .map(|assignment| (assignment.slot(), assignment.clone()))
        .collect()
}

/// Split eligible days into the secondary-duty days (even positions) and the
/// primary-only days (odd positions), both ascending.
pub fn split_eligible_days(eligible_days: &[NaiveDate]) -> (Vec<NaiveDate>, Vec<NaiveDate>) {
    let mut secondary_days = Vec::with_capacity(eligible_days.len().div_ceil(2));
    let mut primary_only_days = Vec::with_capacity(eligible_days.len() / 2);
    for (idx, date) in eligible_days.iter().enumerate() {
        if idx % 2 == 0 {
            secondary_days.push(*date);
        } else {
            primary_only_days.push(*date);
        }
    }
    (secondary_days, primary_only_days)
}

/// Plan a month: shuffle the roster once with `rng`, then run the rotation and balance passes.
///
/// `roster` is the active roster in roster order (it decides fairness tie-breaks).
/// `preserved` holds the month's existing assignments; non-algorithmic ones are never replaced.
pub fn plan_duties<R: Rng + ?Sized>(
    eligible_days: &[NaiveDate],
    roster: &[Member],
    preserved: &[Assignment],
    rng: &mut R,
) -> Result<DutyPlan, PlanError> {
    if roster.is_empty() {
        return Err(PlanError::NoEligibleMembers);
    }
    let mut rotation = roster.to_vec();
    rotation.shuffle(rng);
    plan_with_rotation(eligible_days, roster, &rotation, preserved)
}

/// Same as [`plan_duties`] with the rotation order given explicitly.
pub fn plan_with_rotation(
    eligible_days: &[NaiveDate],
    roster: &[Member],
    rotation: &[Member],
    preserved: &[Assignment],
) -> Result<DutyPlan, PlanError> {
    if roster.is_empty() {
        return Err(PlanError::NoEligibleMembers);
    }
    let roster_ids: HashSet<MemberId> = roster.iter().map(|m| m.id).collect();
    let rotation_ids: HashSet<MemberId> = rotation.iter().map(|m| m.id).collect();
    if rotation.len() != roster.len() || roster_ids != rotation_ids {
        return Err(PlanError::RotationMismatch);
    }

    let occupied = occupied_slots(preserved);
    let mut plan = DutyPlan::seeded(roster, preserved);
    let (secondary_days, primary_only_days) = split_eligible_days(eligible_days);

    // Rotation first: its bundled primary duties feed the balance pass counters.
    RotationPass::new(rotation, &occupied).execute(&secondary_days, &mut plan);
    BalancePass::new(roster, &occupied).execute(&primary_only_days, &mut plan);

    plan.skipped.sort_by_key(|skip| SlotKey::new(skip.date, skip.duty));
    Ok(plan)
}
