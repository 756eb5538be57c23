#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use duty_roster::{
    Assignment, AssignmentLedger, DutyScheduler, DutyType, ErrorKind, Holiday, HolidayStore,
    MonthWindow, NewMember, Origin, RosterStore, SqliteDutyStore, StoreError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tempfile::tempdir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn september() -> MonthWindow {
    "2025-09".parse().unwrap()
}

#[test]
fn sqlite_round_trip_survives_reopen() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("roster.db");

    {
        let store = SqliteDutyStore::new(&path).unwrap();
        let ana = store
            .add_member(NewMember {
                contact_handle: Some("@ana".into()),
                avatar_emoji: Some("🦊".into()),
                ..NewMember::new("Ana")
            })
            .unwrap();
        store.add_member(NewMember::new("Bo")).unwrap();
        store.set_member_active(2, false).unwrap();
        store
            .put_holiday(Holiday::new(d(2025, 9, 1), "Labour day"))
            .unwrap();
        store
            .upsert_assignment(Assignment::new(
                d(2025, 9, 2),
                DutyType::Primary,
                ana.id,
                Origin::Wheel,
            ))
            .unwrap();
    }

    let store = SqliteDutyStore::new(&path).unwrap();
    let members = store.list_members().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "Ana");
    assert_eq!(members[0].contact_handle.as_deref(), Some("@ana"));
    assert_eq!(members[0].avatar_emoji.as_deref(), Some("🦊"));
    assert!(!members[1].active);
    assert_eq!(store.active_members().unwrap().len(), 1);

    let holidays = store.holidays_in(september()).unwrap();
    assert_eq!(holidays, vec![Holiday::new(d(2025, 9, 1), "Labour day")]);

    let on_day = store.assignments_on(d(2025, 9, 2)).unwrap();
    assert_eq!(on_day.len(), 1);
    assert_eq!(on_day[0].origin, Origin::Wheel);
}

#[test]
fn removing_member_cascades_to_assignments() {
    let store = SqliteDutyStore::in_memory().unwrap();
    let ana = store.add_member(NewMember::new("Ana")).unwrap();
    let bo = store.add_member(NewMember::new("Bo")).unwrap();
    store
        .replace_algorithmic(
            september(),
            &[
                Assignment::algorithmic(d(2025, 9, 2), DutyType::Primary, ana.id),
                Assignment::algorithmic(d(2025, 9, 2), DutyType::Secondary, ana.id),
                Assignment::algorithmic(d(2025, 9, 3), DutyType::Primary, bo.id),
            ],
        )
        .unwrap();

    assert!(store.remove_member(ana.id).unwrap());
    assert!(!store.remove_member(ana.id).unwrap());
    let remaining = store.assignments_in(september()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].member_id, bo.id);
}

#[test]
fn upsert_keeps_one_row_per_slot() {
    let store = SqliteDutyStore::in_memory().unwrap();
    let ana = store.add_member(NewMember::new("Ana")).unwrap();
    let bo = store.add_member(NewMember::new("Bo")).unwrap();

    let first = Assignment::new(d(2025, 9, 4), DutyType::Secondary, ana.id, Origin::Manual);
    assert!(store.upsert_assignment(first.clone()).unwrap().is_none());
    let previous = store
        .upsert_assignment(Assignment::new(
            d(2025, 9, 4),
            DutyType::Secondary,
            bo.id,
            Origin::Wheel,
        ))
        .unwrap();
    assert_eq!(previous, Some(first));

    let rows = store.assignments_on(d(2025, 9, 4)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].member_id, bo.id);

    let err = store
        .upsert_assignment(Assignment::new(
            d(2025, 9, 4),
            DutyType::Primary,
            404,
            Origin::Manual,
        ))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn replace_ignores_manual_slots_and_only_touches_the_month() {
    let store = SqliteDutyStore::in_memory().unwrap();
    let ana = store.add_member(NewMember::new("Ana")).unwrap();
    let october: MonthWindow = "2025-10".parse().unwrap();
    store
        .replace_algorithmic(
            october,
            &[Assignment::algorithmic(d(2025, 10, 1), DutyType::Primary, ana.id)],
        )
        .unwrap();
    store
        .upsert_assignment(Assignment::new(
            d(2025, 9, 2),
            DutyType::Primary,
            ana.id,
            Origin::Manual,
        ))
        .unwrap();

    let summary = store
        .replace_algorithmic(
            september(),
            &[
                Assignment::algorithmic(d(2025, 9, 2), DutyType::Primary, ana.id),
                Assignment::algorithmic(d(2025, 9, 2), DutyType::Secondary, ana.id),
            ],
        )
        .unwrap();
    assert_eq!(summary.removed, 0);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.ignored, 1);

    let september_rows = store.assignments_in(september()).unwrap();
    assert_eq!(september_rows.len(), 2);
    assert!(
        september_rows
            .iter()
            .any(|a| a.duty == DutyType::Primary && a.origin == Origin::Manual)
    );
    assert_eq!(store.assignments_in(october).unwrap().len(), 1);
}

#[test]
fn rejected_replacement_leaves_ledger_untouched() {
    let store = SqliteDutyStore::in_memory().unwrap();
    let ana = store.add_member(NewMember::new("Ana")).unwrap();
    store
        .replace_algorithmic(
            september(),
            &[Assignment::algorithmic(d(2025, 9, 2), DutyType::Primary, ana.id)],
        )
        .unwrap();
    let before = store.all_assignments().unwrap();

    // Second row references a member that does not exist, so the foreign key fails
    // after the delete already ran inside the transaction.
    let err = store
        .replace_algorithmic(
            september(),
            &[
                Assignment::algorithmic(d(2025, 9, 3), DutyType::Primary, ana.id),
                Assignment::algorithmic(d(2025, 9, 4), DutyType::Primary, 999),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Sqlite(_)));
    assert_eq!(store.all_assignments().unwrap(), before);

    let err = store
        .replace_algorithmic(
            september(),
            &[Assignment::algorithmic(d(2025, 10, 1), DutyType::Primary, ana.id)],
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
    assert_eq!(store.all_assignments().unwrap(), before);
}

#[test]
fn scheduler_runs_on_sqlite() {
    let store = SqliteDutyStore::in_memory().unwrap();
    for name in ["Ana", "Bo", "Cy"] {
        store.add_member(NewMember::new(name)).unwrap();
    }
    let scheduler = DutyScheduler::new(Arc::new(store));
    let first = scheduler
        .generate_with_rng("2025-09", &mut StdRng::seed_from_u64(3))
        .unwrap();
    let second = scheduler
        .generate_with_rng("2025-09", &mut StdRng::seed_from_u64(4))
        .unwrap();

    assert_eq!(first.eligible_days, 22);
    assert_eq!(second.ledger.removed, 33);
    assert_eq!(scheduler.assignments_in("2025-09").unwrap().len(), 33);
}

#[test]
fn undecodable_rows_surface_as_dependency_failures() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("roster.db");
    let store = SqliteDutyStore::new(&path).unwrap();
    store.add_member(NewMember::new("Ana")).unwrap();

    let raw = rusqlite::Connection::open(&path).unwrap();
    raw.execute("INSERT INTO holidays (date, label) VALUES ('garbage', 'x')", [])
        .unwrap();
    drop(raw);

    let err = store.list_holidays().unwrap_err();
    assert!(matches!(err, StoreError::Inconsistent(_)));

    let scheduler = DutyScheduler::new(Arc::new(store));
    let err = scheduler.generate("2025-09").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert!(err.to_string().contains("garbage"));
    assert!(scheduler.store().all_assignments().unwrap().is_empty());
}
