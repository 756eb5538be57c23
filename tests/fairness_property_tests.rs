use chrono::{Duration, NaiveDate};
use duty_roster::{DutyType, Member, plan_duties};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;

fn days(count: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..count)
        .map(|offset| start + Duration::days(offset as i64))
        .collect()
}

fn roster(size: usize) -> Vec<Member> {
    (1..=size as i64)
        .map(|id| Member::new(id, format!("member-{id}")))
        .collect()
}

proptest! {
    #[test]
    fn primary_load_stays_within_one(day_count in 0usize..32, members in 1usize..9, seed in any::<u64>()) {
        let roster = roster(members);
        let plan = plan_duties(&days(day_count), &roster, &[], &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert!(plan.primary_spread() <= 1);
        prop_assert_eq!(plan.primary_counts.len(), members);
        let total: u32 = plan.primary_counts.values().sum();
        prop_assert_eq!(total as usize, day_count);
    }

    #[test]
    fn every_day_is_covered_once(day_count in 0usize..32, members in 1usize..9, seed in any::<u64>()) {
        let eligible = days(day_count);
        let plan = plan_duties(&eligible, &roster(members), &[], &mut StdRng::seed_from_u64(seed)).unwrap();

        let primary_days: HashSet<NaiveDate> = plan.primary.iter().map(|a| a.date).collect();
        prop_assert_eq!(primary_days.len(), day_count);
        prop_assert_eq!(plan.primary.len(), day_count);
        prop_assert_eq!(plan.secondary.len(), day_count.div_ceil(2));

        for secondary in &plan.secondary {
            prop_assert_eq!(secondary.duty, DutyType::Secondary);
            let bundled = plan
                .primary
                .iter()
                .find(|p| p.date == secondary.date)
                .map(|p| p.member_id);
            prop_assert_eq!(bundled, Some(secondary.member_id));
        }
    }

    #[test]
    fn secondary_rotation_spread_within_one(day_count in 0usize..32, members in 1usize..9, seed in any::<u64>()) {
        let plan = plan_duties(&days(day_count), &roster(members), &[], &mut StdRng::seed_from_u64(seed)).unwrap();
        let mut counts = vec![0usize; members];
        for secondary in &plan.secondary {
            counts[(secondary.member_id - 1) as usize] += 1;
        }
        let max = counts.iter().max().copied().unwrap_or(0);
        let min = counts.iter().min().copied().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }
}
