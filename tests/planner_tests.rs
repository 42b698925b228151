use std::fs;

use chrono::NaiveDate;
use syllabus_planner::{
    FreeDay, HebcalDirectory, HolidaySource, PlanError, PlanSettings, Planner, SyllabusRow,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const FEED_2025: &str = r#"{
  "title": "Hebcal 2025",
  "items": [
    {"title": "Test Holiday", "date": "2025-01-06", "category": "holiday"},
    {"title": "Rosh Chodesh Test", "date": "2025-01-13T00:00:00+02:00", "category": "roshchodesh"},
    {"title": "Parashat Vaera", "date": "2025-01-04", "category": "parashat"}
  ]
}"#;

fn feed_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    fs::write(dir.path().join("2025.json"), FEED_2025).unwrap();
    dir
}

fn rows() -> Vec<SyllabusRow> {
    vec![
        SyllabusRow::new("Intro", "Basics", 3),
        SyllabusRow::new("Final Exam", "Review", 2),
    ]
}

#[test]
fn hebcal_directory_keeps_holiday_categories_only() {
    let dir = feed_dir();
    let source = HebcalDirectory::new(dir.path());
    let set = source.holidays_for_year(2025).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.name_of(d(2025, 1, 6)), Some("Test Holiday"));
    assert!(set.contains(d(2025, 1, 13)));
    assert!(!set.contains(d(2025, 1, 4)));
    assert!(source.holidays_for_year(2026).is_err());
}

#[test]
fn plan_uses_holidays_from_feed_directory() {
    let dir = feed_dir();
    let source = HebcalDirectory::new(dir.path());
    let mut settings = PlanSettings::new(d(2025, 1, 5));
    settings.add_break = true;
    settings.break_days = 2;

    let outcome = Planner::new(settings).plan(&rows(), Some(&source)).unwrap();
    let records = outcome.schedule.records();
    // Intro: Sun 5, Tue 7, Wed 8 (Mon 6 is a holiday)
    assert_eq!((records[0].start_date, records[0].end_date), (d(2025, 1, 5), d(2025, 1, 8)));
    // Break: Thu 9, Sun 12
    assert_eq!((records[1].start_date, records[1].end_date), (d(2025, 1, 9), d(2025, 1, 12)));
    // Final Exam: Mon 13 is a holiday, so Tue 14 and Wed 15
    assert_eq!((records[2].start_date, records[2].end_date), (d(2025, 1, 14), d(2025, 1, 15)));

    assert_eq!(outcome.summary.total_items, 4);
    assert_eq!(outcome.statistics.holiday_days, 2);
    assert_eq!(outcome.statistics.holiday_list[0].name, "Test Holiday");
    let exam = &outcome.statistics.exam_projections[0];
    assert_eq!(exam.main_topic, "Final Exam");
}

#[test]
fn ignoring_holidays_keeps_free_days() {
    let dir = feed_dir();
    let source = HebcalDirectory::new(dir.path());
    let mut settings = PlanSettings::new(d(2025, 1, 5));
    settings.consider_holidays = false;
    settings.free_days = vec![FreeDay::Range {
        start: d(2025, 1, 7),
        end: d(2025, 1, 8),
    }];

    let outcome = Planner::new(settings)
        .plan(&[SyllabusRow::new("Intro", "Basics", 3)], Some(&source))
        .unwrap();
    let record = &outcome.schedule.records()[0];
    // Sun 5, Mon 6, then Thu 9
    assert_eq!(record.end_date, d(2025, 1, 9));
    assert_eq!(outcome.statistics.holiday_list.len(), 2);
    assert_eq!(outcome.statistics.holiday_list[0].name, "Additional free day");
}

#[test]
fn missing_feed_directory_degrades_to_no_holidays() {
    let source = HebcalDirectory::new("/definitely/not/here");
    let outcome = Planner::new(PlanSettings::new(d(2025, 1, 5)))
        .plan(&[SyllabusRow::new("Intro", "Basics", 3)], Some(&source))
        .unwrap();
    assert_eq!(outcome.schedule.records()[0].end_date, d(2025, 1, 7));
    assert_eq!(outcome.statistics.holiday_days, 0);
}

#[test]
fn empty_syllabus_is_rejected() {
    let err = Planner::new(PlanSettings::new(d(2025, 1, 5)))
        .plan(&[], None)
        .unwrap_err();
    assert!(matches!(err, PlanError::EmptySyllabus));
}
