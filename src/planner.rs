use crate::calculations::{ScheduleAllocator, ScheduleStatistics, StatisticsEngine};
use crate::calendar::{CalendarError, WorkCalendar};
use crate::holidays::{HolidaySet, HolidaySource, collect_holidays};
use crate::schedule::{Schedule, ScheduleSummary};
use crate::settings::{MAX_BREAK_DAYS, MAX_FREE_DAY_SPAN, MAX_ROW_DAYS, PlanSettings};
use crate::syllabus::SyllabusRow;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("syllabus has no rows to schedule")]
    EmptySyllabus,
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

pub type PlanResult<T> = Result<T, PlanError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub schedule: Schedule,
    pub statistics: ScheduleStatistics,
    pub summary: ScheduleSummary,
}

/// Wires settings, holidays, the allocator and statistics together.
pub struct Planner {
    settings: PlanSettings,
}

impl Planner {
    pub fn new(settings: PlanSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PlanSettings {
        &self.settings
    }

    /// Holiday set the plan runs against: the source's dates for the start
    /// year and the next (when holidays are considered) plus any free days.
    pub fn holiday_set(&self, source: Option<&dyn HolidaySource>) -> HolidaySet {
        let mut holidays = match source {
            Some(source) if self.settings.consider_holidays => {
                collect_holidays(source, self.settings.start_date.year())
            }
            _ => HolidaySet::new(),
        };
        holidays.add_free_days(&self.settings.free_days);
        holidays
    }

    pub fn calendar(&self, source: Option<&dyn HolidaySource>) -> PlanResult<WorkCalendar> {
        let holidays = self.holiday_set(source);
        Ok(WorkCalendar::from_config(&self.settings.calendar, holidays)?)
    }

    pub fn plan(
        &self,
        rows: &[SyllabusRow],
        source: Option<&dyn HolidaySource>,
    ) -> PlanResult<PlanOutcome> {
        self.validate(rows)?;
        let calendar = self.calendar(source)?;
        self.run(rows, &calendar)
    }

    pub fn plan_with_calendar(
        &self,
        rows: &[SyllabusRow],
        calendar: &WorkCalendar,
    ) -> PlanResult<PlanOutcome> {
        self.validate(rows)?;
        self.run(rows, calendar)
    }

    fn run(&self, rows: &[SyllabusRow], calendar: &WorkCalendar) -> PlanResult<PlanOutcome> {
        let allocator = ScheduleAllocator::new(calendar, self.settings.allocation());
        let schedule = allocator.execute(rows, self.settings.start_date)?;
        let statistics = StatisticsEngine::with_keywords(calendar, &self.settings.exam_keywords)
            .compute_for(&schedule)?;
        let summary = schedule.summary();
        info!(
            rows = rows.len(),
            records = schedule.len(),
            holidays = calendar.holidays().len(),
            "schedule generated"
        );

        Ok(PlanOutcome {
            schedule,
            statistics,
            summary,
        })
    }

    fn validate(&self, rows: &[SyllabusRow]) -> PlanResult<()> {
        if rows.is_empty() {
            return Err(PlanError::EmptySyllabus);
        }
        if self.settings.add_break && self.settings.break_days > MAX_BREAK_DAYS {
            return Err(PlanError::InvalidSettings(format!(
                "break_days must be at most {MAX_BREAK_DAYS} (got {})",
                self.settings.break_days
            )));
        }
        if let Some(row) = rows.iter().find(|row| row.days_needed > MAX_ROW_DAYS) {
            return Err(PlanError::InvalidSettings(format!(
                "subtopic '{}' needs {} days, at most {MAX_ROW_DAYS} allowed",
                row.subtopic, row.days_needed
            )));
        }
        if let Some(free_day) = self
            .settings
            .free_days
            .iter()
            .find(|free_day| free_day.span_days() > u64::from(MAX_FREE_DAY_SPAN))
        {
            return Err(PlanError::InvalidSettings(format!(
                "free day range covers {} days, at most {MAX_FREE_DAY_SPAN} allowed",
                free_day.span_days()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::{FreeDay, StaticHolidaySource};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn free_days_apply_without_holiday_source() {
        let mut settings = PlanSettings::new(d(2025, 1, 5));
        settings.consider_holidays = false;
        settings.free_days = vec![FreeDay::Single { date: d(2025, 1, 6) }];
        let source = StaticHolidaySource::new(HolidaySet::from_iter([d(2025, 1, 7)]));
        let planner = Planner::new(settings);
        let holidays = planner.holiday_set(Some(&source));
        assert!(holidays.contains(d(2025, 1, 6)));
        assert!(!holidays.contains(d(2025, 1, 7)));
    }

    #[test]
    fn plan_rejects_empty_syllabus_and_oversized_breaks() {
        let mut settings = PlanSettings::new(d(2025, 1, 5));
        assert!(matches!(
            Planner::new(settings.clone()).plan(&[], None),
            Err(PlanError::EmptySyllabus)
        ));
        settings.add_break = true;
        settings.break_days = MAX_BREAK_DAYS + 1;
        let rows = vec![SyllabusRow::new("A", "a1", 1)];
        assert!(matches!(
            Planner::new(settings).plan(&rows, None),
            Err(PlanError::InvalidSettings(_))
        ));
    }

    #[test]
    fn oversized_rows_and_free_day_ranges_are_rejected() {
        let planner = Planner::new(PlanSettings::new(d(2025, 1, 5)));
        let rows = vec![SyllabusRow::new("A", "a1", u32::MAX)];
        assert!(matches!(
            planner.plan(&rows, None),
            Err(PlanError::InvalidSettings(_))
        ));

        let mut settings = PlanSettings::new(d(2025, 1, 5));
        settings.free_days = vec![FreeDay::Range {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }];
        let rows = vec![SyllabusRow::new("A", "a1", 1)];
        match Planner::new(settings).plan(&rows, None) {
            Err(PlanError::InvalidSettings(message)) => assert!(message.contains("free day")),
            other => panic!("expected invalid settings, got {other:?}"),
        }
    }

    #[test]
    fn exam_on_last_representable_date_is_an_error() {
        let rows = vec![SyllabusRow::new("Final Exam", "Review", 0)];
        assert!(matches!(
            Planner::new(PlanSettings::new(NaiveDate::MAX)).plan(&rows, None),
            Err(PlanError::Calendar(CalendarError::DateOverflow(_)))
        ));
    }
}
