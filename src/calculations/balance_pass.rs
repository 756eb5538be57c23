use super::{DutyPlan, OccupiedSlots, SkippedSlot};
use crate::assignment::{Assignment, DutyType, SlotKey};
use crate::member::Member;
use chrono::NaiveDate;

/// Greedy load balancing for the primary-only days: each day goes to the member
/// with the lowest running primary count, ties resolved by roster order.
pub struct BalancePass<'a> {
    roster: &'a [Member],
    occupied: &'a OccupiedSlots,
}

impl<'a> BalancePass<'a> {
    pub(crate) fn new(roster: &'a [Member], occupied: &'a OccupiedSlots) -> Self {
        Self { roster, occupied }
    }

    pub(crate) fn execute(&self, primary_only_days: &[NaiveDate], plan: &mut DutyPlan) {
        for date in primary_only_days {
            // min_by_key keeps the first of equal minima, i.e. roster order.
            let Some(member) = self
                .roster
                .iter()
                .min_by_key(|member| plan.count_for(member.id))
            else {
                return;
            };

            let slot = SlotKey::new(*date, DutyType::Primary);
            if let Some(owner) = self.occupied.get(&slot) {
                plan.skipped.push(SkippedSlot {
                    date: *date,
                    duty: DutyType::Primary,
                    occupied_by: owner.member_id,
                    origin: owner.origin,
                    planned_member: member.id,
                });
                continue;
            }

            plan.primary
                .push(Assignment::algorithmic(*date, DutyType::Primary, member.id));
            plan.bump(member.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn picks_lowest_count_then_roster_order() {
        let roster = vec![Member::new(1, "A"), Member::new(2, "B"), Member::new(3, "C")];
        let occupied = HashMap::new();
        let mut plan = DutyPlan::seeded(&roster, &[]);
        plan.bump(1);
        plan.bump(2);
        plan.bump(2);
        plan.bump(3);
        plan.bump(3);

        let days: Vec<NaiveDate> = (1..=5)
            .map(|day| NaiveDate::from_ymd_opt(2025, 9, day).unwrap())
            .collect();
        BalancePass::new(&roster, &occupied).execute(&days, &mut plan);

        let owners: Vec<i64> = plan.primary.iter().map(|a| a.member_id).collect();
        assert_eq!(owners, vec![1, 1, 2, 3, 1]);
        assert_eq!(plan.count_for(1), 4);
        assert_eq!(plan.count_for(2), 3);
        assert_eq!(plan.count_for(3), 3);
    }
}
