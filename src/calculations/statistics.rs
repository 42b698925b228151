use crate::calendar::{CalendarResult, WorkCalendar};
use crate::holidays::UNNAMED_HOLIDAY;
use crate::schedule::{Schedule, ScheduleRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_EXAM_KEYWORDS: [&str; 2] = ["exam", "milestone"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamProjection {
    pub main_topic: String,
    pub exam_date: NaiveDate,
    pub day_of_week: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatistics {
    pub break_days: u64,
    pub holiday_days: usize,
    pub holiday_list: Vec<HolidayEntry>,
    pub weekend_days: u32,
    pub exam_projections: Vec<ExamProjection>,
}

impl ScheduleStatistics {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("break_days={}", self.break_days),
            format!("holidays={}", self.holiday_days),
            format!("weekend_days={}", self.weekend_days),
        ];
        for projection in &self.exam_projections {
            parts.push(format!(
                "exam[{}]={} ({})",
                projection.main_topic, projection.exam_date, projection.day_of_week
            ));
        }
        parts.join(", ")
    }
}

pub struct StatisticsEngine<'a> {
    calendar: &'a WorkCalendar,
    exam_keywords: Vec<String>,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(calendar: &'a WorkCalendar) -> Self {
        Self::with_keywords(calendar, DEFAULT_EXAM_KEYWORDS)
    }

    pub fn with_keywords<I, S>(calendar: &'a WorkCalendar, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exam_keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            calendar,
            exam_keywords,
        }
    }

    /// Statistics over the schedule's own span.
    pub fn compute_for(&self, schedule: &Schedule) -> CalendarResult<ScheduleStatistics> {
        match schedule.span() {
            Some((start, end)) => self.compute(schedule, start, end),
            None => Ok(ScheduleStatistics::default()),
        }
    }

    pub fn compute(
        &self,
        schedule: &Schedule,
        overall_start: NaiveDate,
        overall_end: NaiveDate,
    ) -> CalendarResult<ScheduleStatistics> {
        let break_days = schedule
            .break_records()
            .map(|record| u64::from(record.duration_days))
            .sum();

        let holidays = self.calendar.holidays();
        let holiday_list: Vec<HolidayEntry> = holidays
            .in_range(overall_start, overall_end)
            .into_iter()
            .map(|date| HolidayEntry {
                date,
                name: holidays.name_of(date).unwrap_or(UNNAMED_HOLIDAY).to_string(),
            })
            .collect();

        let weekend_days = if overall_start <= overall_end {
            self.calendar.count_off_days(overall_start, overall_end)
        } else {
            0
        };

        Ok(ScheduleStatistics {
            break_days,
            holiday_days: holiday_list.len(),
            holiday_list,
            weekend_days,
            exam_projections: self.project_exams(schedule)?,
        })
    }

    /// Exam dates sit on the first off-day-free date after the topic ends;
    /// holidays are not consulted.
    fn project_exams(&self, schedule: &Schedule) -> CalendarResult<Vec<ExamProjection>> {
        let mut order: Vec<&str> = Vec::new();
        let mut last_record: HashMap<&str, &ScheduleRecord> = HashMap::new();
        for record in schedule.work_records() {
            let topic = record.main_topic.as_str();
            if last_record.insert(topic, record).is_none() {
                order.push(topic);
            }
        }

        let weekly = self.calendar.without_holidays();
        let mut projections = Vec::new();
        for topic in order {
            if !self.matches_keyword(topic) {
                continue;
            }
            let Some(last) = last_record.get(topic) else {
                continue;
            };
            let exam_date = weekly.next_working_day(WorkCalendar::succ(last.end_date)?)?;
            projections.push(ExamProjection {
                main_topic: topic.to_string(),
                exam_date,
                day_of_week: exam_date.format("%A").to_string(),
            });
        }
        Ok(projections)
    }

    fn matches_keyword(&self, topic: &str) -> bool {
        let topic = topic.to_lowercase();
        self.exam_keywords.iter().any(|k| topic.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarError;
    use crate::holidays::HolidaySet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let calendar = WorkCalendar::default();
        let engine = StatisticsEngine::with_keywords(&calendar, ["EXAM", " ", "quiz"]);
        assert!(engine.matches_keyword("Midterm exam"));
        assert!(engine.matches_keyword("Pop Quiz 1"));
        assert!(!engine.matches_keyword("Review"));
    }

    #[test]
    fn unnamed_holidays_get_placeholder() {
        let mut holidays = HolidaySet::new();
        holidays.insert(d(2025, 1, 6), None);
        holidays.insert(d(2025, 1, 7), Some("Fast".into()));
        holidays.insert(d(2025, 2, 1), Some("Outside".into()));
        let calendar = WorkCalendar::new(holidays);
        let schedule = Schedule::new(vec![ScheduleRecord::work(
            "Intro",
            "Basics",
            d(2025, 1, 5),
            d(2025, 1, 9),
            3,
        )]);
        let stats = StatisticsEngine::new(&calendar).compute_for(&schedule).unwrap();
        assert_eq!(stats.holiday_days, 2);
        assert_eq!(stats.holiday_list[0].name, UNNAMED_HOLIDAY);
        assert_eq!(stats.holiday_list[1].name, "Fast");
        assert_eq!(stats.weekend_days, 0);
    }

    #[test]
    fn empty_schedule_has_zeroed_statistics() {
        let calendar = WorkCalendar::default();
        let stats = StatisticsEngine::new(&calendar)
            .compute_for(&Schedule::default())
            .unwrap();
        assert_eq!(stats, ScheduleStatistics::default());
    }

    #[test]
    fn exam_ending_on_last_date_reports_overflow() {
        let calendar = WorkCalendar::default();
        let schedule = Schedule::new(vec![ScheduleRecord::work(
            "Final Exam",
            "Review",
            NaiveDate::MAX,
            NaiveDate::MAX,
            0,
        )]);
        let err = StatisticsEngine::new(&calendar)
            .compute_for(&schedule)
            .unwrap_err();
        assert_eq!(err, CalendarError::DateOverflow(NaiveDate::MAX));
    }
}
