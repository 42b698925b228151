use crate::calculations::breaks::BreakInserter;
use crate::calendar::{CalendarResult, WorkCalendar};
use crate::schedule::{Schedule, ScheduleRecord};
use crate::syllabus::SyllabusRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConfig {
    pub add_break: bool,
    pub break_days: u32,
}

impl AllocationConfig {
    pub fn breaks_enabled(&self) -> bool {
        self.add_break && self.break_days > 0
    }
}

/// Greedy day walk turning syllabus rows into dated records.
///
/// Rows are placed in file order. A topic's first row snaps the cursor to a
/// working day; once its last row (looking ahead over the whole input) is
/// placed, an optional break follows. Topics may be interleaved.
pub struct ScheduleAllocator<'a> {
    calendar: &'a WorkCalendar,
    config: AllocationConfig,
}

struct Placement {
    cursor: NaiveDate,
    seen_topics: HashSet<String>,
    records: Vec<ScheduleRecord>,
}

impl<'a> ScheduleAllocator<'a> {
    pub fn new(calendar: &'a WorkCalendar, config: AllocationConfig) -> Self {
        Self { calendar, config }
    }

    pub fn execute(&self, rows: &[SyllabusRow], start_date: NaiveDate) -> CalendarResult<Schedule> {
        let last_index: HashMap<&str, usize> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (row.main_topic.as_str(), idx))
            .collect();

        let initial = Placement {
            cursor: start_date,
            seen_topics: HashSet::new(),
            records: Vec::with_capacity(rows.len() * 2),
        };
        let placement = rows
            .iter()
            .enumerate()
            .try_fold(initial, |placement, (idx, row)| {
                let is_last = last_index.get(row.main_topic.as_str()) == Some(&idx);
                self.place_row(placement, row, is_last)
            })?;

        Ok(Schedule::new(placement.records))
    }

    fn place_row(
        &self,
        mut placement: Placement,
        row: &SyllabusRow,
        is_last: bool,
    ) -> CalendarResult<Placement> {
        let mut cursor = placement.cursor;
        if placement.seen_topics.insert(row.main_topic.clone()) {
            cursor = self.calendar.next_working_day(cursor)?;
            debug!(topic = %row.main_topic, %cursor, "topic anchored");
        }

        // zero-day rows keep the raw cursor; others start on the first day they consume,
        // so every non-empty record starts and ends on a working day
        let start = if row.days_needed == 0 {
            cursor
        } else {
            self.calendar.next_working_day(cursor)?
        };
        let (end, next_cursor) = self
            .calendar
            .advance_by_working_days(start, row.days_needed)?;
        placement.records.push(ScheduleRecord::work(
            row.main_topic.clone(),
            row.subtopic.clone(),
            start,
            end,
            row.days_needed,
        ));
        cursor = next_cursor;

        if is_last && self.config.breaks_enabled() {
            let inserter = BreakInserter::new(self.calendar);
            let (record, after_break) =
                inserter.insert_break(cursor, &row.main_topic, self.config.break_days)?;
            debug!(topic = %row.main_topic, start = %record.start_date, end = %record.end_date, "break inserted");
            placement.records.push(record);
            cursor = after_break;
        }

        placement.cursor = cursor;
        Ok(placement)
    }
}
