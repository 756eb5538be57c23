use chrono::{Datelike, NaiveDate, Weekday};
use duty_roster::{DayKind, DutyCalendar, Holiday, MonthWindow};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn september_2025() -> MonthWindow {
    "2025-09".parse().unwrap()
}

#[test]
fn eligible_days_skip_weekends_and_holidays() {
    let calendar = DutyCalendar::with_holidays([
        Holiday::new(d(2025, 9, 1), "Labour day"),
        Holiday::new(d(2025, 9, 10), ""),
        Holiday::new(d(2025, 9, 17), "Offsite"),
        Holiday::new(d(2025, 9, 30), "Quarter close"),
    ]);

    let days = calendar.eligible_days(september_2025());
    assert_eq!(days.len(), 18);
    assert_eq!(days.first(), Some(&d(2025, 9, 2)));
    assert_eq!(days.last(), Some(&d(2025, 9, 29)));
    assert!(days.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(
        days.iter()
            .all(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
    );
    assert!(!days.contains(&d(2025, 9, 10)));
}

#[test]
fn weekend_holiday_is_still_a_weekend_for_counting() {
    let calendar = DutyCalendar::with_holidays([Holiday::new(d(2025, 9, 6), "Saturday party")]);
    assert_eq!(calendar.count_eligible_days(september_2025()), 22);
    assert_eq!(calendar.day_kind(d(2025, 9, 6)), DayKind::Holiday);
    assert_eq!(calendar.day_kind(d(2025, 9, 7)), DayKind::Weekend);
    assert_eq!(calendar.day_kind(d(2025, 9, 8)), DayKind::Eligible);
}

#[test]
fn holidays_outside_the_month_are_ignored() {
    let calendar = DutyCalendar::with_holidays([
        Holiday::new(d(2025, 8, 29), "Previous month"),
        Holiday::new(d(2025, 10, 1), "Next month"),
    ]);
    assert_eq!(calendar.count_eligible_days(september_2025()), 22);
    assert!(calendar.holidays_in(september_2025()).is_empty());
}

#[test]
fn month_of_holidays_has_no_eligible_days() {
    let month: MonthWindow = "2025-02".parse().unwrap();
    let calendar = DutyCalendar::with_holidays(month.days().map(|day| Holiday::new(day, "")));
    assert!(calendar.eligible_days(month).is_empty());
}

#[test]
fn blank_label_falls_back_to_default() {
    let mut calendar = DutyCalendar::new();
    calendar.add_holiday(Holiday::new(d(2025, 12, 25), "   "));
    assert_eq!(calendar.holiday_label(d(2025, 12, 25)), Some("Holiday"));
    assert!(!calendar.toggle_holiday(d(2025, 12, 25)));
    assert!(!calendar.is_holiday(d(2025, 12, 25)));
}

#[test]
fn leap_february_has_twenty_one_weekdays() {
    let month: MonthWindow = "2024-02".parse().unwrap();
    assert_eq!(month.day_count(), 29);
    assert_eq!(DutyCalendar::new().count_eligible_days(month), 21);
}
