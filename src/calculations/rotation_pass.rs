use super::{DutyPlan, OccupiedSlots, SkippedSlot};
use crate::assignment::{Assignment, DutyType, SlotKey};
use crate::member::Member;
use chrono::NaiveDate;

/// Round-robin over the shuffled roster for the secondary-duty days. Each day's
/// member also takes that day's primary duty.
pub struct RotationPass<'a> {
    rotation: &'a [Member],
    occupied: &'a OccupiedSlots,
}

impl<'a> RotationPass<'a> {
    pub(crate) fn new(rotation: &'a [Member], occupied: &'a OccupiedSlots) -> Self {
        Self { rotation, occupied }
    }

    pub(crate) fn execute(&self, secondary_days: &[NaiveDate], plan: &mut DutyPlan) {
        if self.rotation.is_empty() {
            return;
        }
        for (idx, date) in secondary_days.iter().enumerate() {
            // The cursor advances even when a slot is skipped.
            let member = &self.rotation[idx % self.rotation.len()];

            for duty in DutyType::ALL {
                let slot = SlotKey::new(*date, duty);
                if let Some(owner) = self.occupied.get(&slot) {
                    plan.skipped.push(SkippedSlot {
                        date: *date,
                        duty,
                        occupied_by: owner.member_id,
                        origin: owner.origin,
                        planned_member: member.id,
                    });
                    continue;
                }
                let assignment = Assignment::algorithmic(*date, duty, member.id);
                match duty {
                    DutyType::Primary => {
                        plan.primary.push(assignment);
                        plan.bump(member.id);
                    }
                    DutyType::Secondary => plan.secondary.push(assignment),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::Origin;
    use std::collections::HashMap;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
    }

    #[test]
    fn cycles_through_rotation_and_bundles_primary() {
        let rotation = vec![Member::new(2, "B"), Member::new(3, "C"), Member::new(1, "A")];
        let occupied = HashMap::new();
        let mut plan = DutyPlan::seeded(&rotation, &[]);
        let days = [d(1), d(3), d(5), d(9)];

        RotationPass::new(&rotation, &occupied).execute(&days, &mut plan);

        let owners: Vec<i64> = plan.secondary.iter().map(|a| a.member_id).collect();
        assert_eq!(owners, vec![2, 3, 1, 2]);
        assert_eq!(plan.primary.len(), 4);
        assert_eq!(plan.count_for(2), 2);
        assert_eq!(plan.count_for(3), 1);
        assert_eq!(plan.count_for(1), 1);
    }

    #[test]
    fn occupied_primary_is_skipped_without_counting() {
        let rotation = vec![Member::new(1, "A"), Member::new(2, "B")];
        let manual = Assignment::new(d(1), DutyType::Primary, 2, Origin::Manual);
        let occupied = HashMap::from([(manual.slot(), manual)]);
        let mut plan = DutyPlan::seeded(&rotation, &[]);

        RotationPass::new(&rotation, &occupied).execute(&[d(1), d(3)], &mut plan);

        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].occupied_by, 2);
        assert_eq!(plan.skipped[0].planned_member, 1);
        // Secondary on day 1 still goes to A, day 3 continues the cycle with B.
        assert_eq!(plan.secondary[0].member_id, 1);
        assert_eq!(plan.secondary[1].member_id, 2);
        assert_eq!(plan.count_for(1), 0);
        assert_eq!(plan.count_for(2), 1);
    }
}
