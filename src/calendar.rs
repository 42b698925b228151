use crate::holidays::HolidaySet;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Consecutive non-working days tolerated before a search gives up.
pub const DEFAULT_SEARCH_HORIZON_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("no working day reachable within {horizon_days} days of {from}")]
    UnreachableWorkingDay { from: NaiveDate, horizon_days: u32 },
    #[error("calendar requires at least one working weekday")]
    NoWorkingWeekdays,
    #[error("date arithmetic overflowed past {0}")]
    DateOverflow(NaiveDate),
}

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Working-day calendar: a fixed set of weekly off-days plus a holiday set.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCalendar {
    holidays: HolidaySet,
    non_working_days: HashSet<Weekday>,
    search_horizon_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    off_days: Vec<Weekday>,
    #[serde(default = "default_horizon")]
    search_horizon_days: u32,
}

fn default_horizon() -> u32 {
    DEFAULT_SEARCH_HORIZON_DAYS
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::new(HolidaySet::default())
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Friday and Saturday off, Sunday through Thursday working.
    pub const DEFAULT_OFF_DAYS: [Weekday; 2] = [Weekday::Fri, Weekday::Sat];

    pub fn new(holidays: HolidaySet) -> Self {
        Self {
            holidays,
            non_working_days: HashSet::from(Self::DEFAULT_OFF_DAYS),
            search_horizon_days: DEFAULT_SEARCH_HORIZON_DAYS,
        }
    }

    pub fn from_config(config: &WorkCalendarConfig, holidays: HolidaySet) -> CalendarResult<Self> {
        let non_working_days: HashSet<Weekday> = config.off_days.iter().copied().collect();
        if non_working_days.len() >= Self::ALL_WEEKDAYS.len() {
            return Err(CalendarError::NoWorkingWeekdays);
        }
        Ok(Self {
            holidays,
            non_working_days,
            search_horizon_days: config.search_horizon_days.max(1),
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    pub fn with_search_horizon(mut self, days: u32) -> Self {
        self.search_horizon_days = days.max(1);
        self
    }

    /// Same off-days and horizon, no holidays.
    pub fn without_holidays(&self) -> Self {
        Self {
            holidays: HolidaySet::default(),
            non_working_days: self.non_working_days.clone(),
            search_horizon_days: self.search_horizon_days,
        }
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    pub fn search_horizon_days(&self) -> u32 {
        self.search_horizon_days
    }

    pub fn is_off_day(&self, date: NaiveDate) -> bool {
        self.non_working_days.contains(&date.weekday())
    }

    /// Check if a date is a working day
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.is_off_day(date) && !self.holidays.contains(date)
    }

    /// The date itself when it is a working day, otherwise the earliest later one.
    pub fn next_working_day(&self, from: NaiveDate) -> CalendarResult<NaiveDate> {
        let mut current = from;
        let mut skipped = 0u32;
        while !self.is_working_day(current) {
            skipped += 1;
            if skipped > self.search_horizon_days {
                return Err(self.unreachable(from));
            }
            current = Self::succ(current)?;
        }
        Ok(current)
    }

    /// Walk forward from `start` until `count` working days have been consumed.
    ///
    /// Returns the date on which the last working day was consumed and the
    /// cursor for the following allocation (the day after it). A zero count
    /// consumes nothing: both values are `start`.
    pub fn advance_by_working_days(
        &self,
        start: NaiveDate,
        count: u32,
    ) -> CalendarResult<(NaiveDate, NaiveDate)> {
        if count == 0 {
            return Ok((start, start));
        }

        let mut current = start;
        let mut consumed = 0u32;
        let mut idle_streak = 0u32;
        loop {
            if self.is_working_day(current) {
                consumed += 1;
                idle_streak = 0;
                if consumed == count {
                    return Ok((current, Self::succ(current)?));
                }
            } else {
                idle_streak += 1;
                if idle_streak > self.search_horizon_days {
                    return Err(self.unreachable(current));
                }
            }
            current = Self::succ(current)?;
        }
    }

    /// Get all working days in a date range
    pub fn working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        Self::dates_in_range(start, end)
            .filter(|date| self.is_working_day(*date))
            .collect()
    }

    /// Count working days in a date range
    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        Self::dates_in_range(start, end)
            .filter(|date| self.is_working_day(*date))
            .count() as u32
    }

    /// Count weekly off-days in a date range, holidays notwithstanding
    pub fn count_off_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        Self::dates_in_range(start, end)
            .filter(|date| self.is_off_day(*date))
            .count() as u32
    }

    pub(crate) fn dates_in_range(
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = NaiveDate> {
        start.iter_days().take_while(move |date| *date <= end)
    }

    pub(crate) fn succ(date: NaiveDate) -> CalendarResult<NaiveDate> {
        date.checked_add_signed(Duration::days(1))
            .ok_or(CalendarError::DateOverflow(date))
    }

    fn unreachable(&self, from: NaiveDate) -> CalendarError {
        CalendarError::UnreachableWorkingDay {
            from,
            horizon_days: self.search_horizon_days,
        }
    }
}

impl WorkCalendarConfig {
    pub fn new<I>(off_days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut off: Vec<Weekday> = off_days.into_iter().collect();
        off.sort_by_key(|wd| wd.num_days_from_monday());
        off.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());
        Self {
            off_days: off,
            search_horizon_days: DEFAULT_SEARCH_HORIZON_DAYS,
        }
    }

    pub fn with_search_horizon(mut self, days: u32) -> Self {
        self.search_horizon_days = days;
        self
    }

    pub fn off_days(&self) -> &[Weekday] {
        &self.off_days
    }

    pub fn search_horizon_days(&self) -> u32 {
        self.search_horizon_days
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        Self::new(WorkCalendar::DEFAULT_OFF_DAYS)
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let off = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| calendar.non_working_days.contains(day));
        Self::new(off).with_search_horizon(calendar.search_horizon_days)
    }
}
