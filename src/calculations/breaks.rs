use crate::calendar::{CalendarResult, WorkCalendar};
use crate::schedule::ScheduleRecord;
use chrono::NaiveDate;

/// Places a rest period of `break_days` working days after a topic.
pub struct BreakInserter<'a> {
    calendar: &'a WorkCalendar,
}

impl<'a> BreakInserter<'a> {
    pub fn new(calendar: &'a WorkCalendar) -> Self {
        Self { calendar }
    }

    /// Returns the break record and the cursor following it.
    pub fn insert_break(
        &self,
        cursor: NaiveDate,
        main_topic: &str,
        break_days: u32,
    ) -> CalendarResult<(ScheduleRecord, NaiveDate)> {
        let break_start = self.calendar.next_working_day(cursor)?;
        let (break_end, next_cursor) = self
            .calendar
            .advance_by_working_days(break_start, break_days)?;
        let record = ScheduleRecord::rest(main_topic, break_start, break_end, break_days);
        Ok((record, next_cursor))
    }
}
