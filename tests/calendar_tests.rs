use chrono::{Datelike, NaiveDate, Weekday};
use syllabus_planner::{CalendarError, HolidaySet, WorkCalendar, WorkCalendarConfig};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn friday_and_saturday_are_off_by_default() {
    let cal = WorkCalendar::default();
    // 2025-01-10 is a Friday, 2025-01-11 a Saturday
    assert!(!cal.is_working_day(d(2025, 1, 10)));
    assert!(!cal.is_working_day(d(2025, 1, 11)));
    assert!(cal.is_working_day(d(2025, 1, 12)));
}

#[test]
fn holidays_are_not_working_days() {
    let cal = WorkCalendar::new(HolidaySet::from_iter([d(2025, 1, 6)]));
    assert!(!cal.is_working_day(d(2025, 1, 6)));
    assert!(!cal.is_off_day(d(2025, 1, 6)));
}

#[test]
fn next_working_day_skips_weekend_and_holiday() {
    let cal = WorkCalendar::new(HolidaySet::from_iter([d(2025, 1, 12)]));
    let next = cal.next_working_day(d(2025, 1, 10)).unwrap();
    assert_eq!(next, d(2025, 1, 13));
    assert_eq!(next.weekday(), Weekday::Mon);
}

#[test]
fn advance_counts_only_working_days() {
    let cal = WorkCalendar::default();
    // Wednesday + 3 working days: Wed, Thu, Sun
    let (end, cursor) = cal.advance_by_working_days(d(2025, 1, 8), 3).unwrap();
    assert_eq!(end, d(2025, 1, 12));
    assert_eq!(cursor, d(2025, 1, 13));
    assert_eq!(cal.count_working_days(d(2025, 1, 8), end), 3);
}

#[test]
fn working_days_in_range_and_count_match() {
    let cal = WorkCalendar::new(HolidaySet::from_iter([d(2025, 1, 7)]));
    let days = cal.working_days_in_range(d(2025, 1, 5), d(2025, 1, 12));
    assert_eq!(days.len() as u32, cal.count_working_days(d(2025, 1, 5), d(2025, 1, 12)));
    assert_eq!(days, vec![d(2025, 1, 5), d(2025, 1, 6), d(2025, 1, 8), d(2025, 1, 9), d(2025, 1, 12)]);
    assert_eq!(cal.count_off_days(d(2025, 1, 5), d(2025, 1, 12)), 2);
}

#[test]
fn custom_off_days_from_config() {
    let config = WorkCalendarConfig::new([Weekday::Sat, Weekday::Sun]);
    let cal = WorkCalendar::from_config(&config, HolidaySet::new()).unwrap();
    assert!(cal.is_working_day(d(2025, 1, 10)));
    assert!(!cal.is_working_day(d(2025, 1, 12)));
}

#[test]
fn long_holiday_block_hits_search_horizon() {
    let block: HolidaySet = d(2025, 1, 1).iter_days().take(30).collect();
    let cal = WorkCalendar::new(block).with_search_horizon(10);
    match cal.next_working_day(d(2025, 1, 1)) {
        Err(CalendarError::UnreachableWorkingDay { from, horizon_days }) => {
            assert_eq!(from, d(2025, 1, 1));
            assert_eq!(horizon_days, 10);
        }
        other => panic!("expected unreachable working day, got {other:?}"),
    }
}
