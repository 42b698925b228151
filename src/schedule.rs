use chrono::{Datelike, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const BREAK_SUBTOPIC: &str = "Break Period";
pub const BREAK_SUFFIX: &str = " - Break";

pub const COLUMN_MAIN_TOPIC: &str = "Main Topic";
pub const COLUMN_SUBTOPIC: &str = "Subtopic";
pub const COLUMN_START_DATE: &str = "Start Date";
pub const COLUMN_END_DATE: &str = "End Date";
pub const COLUMN_DURATION: &str = "Duration (Days)";
pub const COLUMN_KIND: &str = "Kind";

// 1970-01-01 counted from 0001-01-01
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Work,
    Break,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Work => "work",
            RecordKind::Break => "break",
        }
    }
}

/// A dated block of the schedule.
///
/// For break records `main_topic` is the topic the break follows; the
/// exported label is produced by [`ScheduleRecord::display_topic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub main_topic: String,
    pub subtopic: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub kind: RecordKind,
}

impl ScheduleRecord {
    pub fn work(
        main_topic: impl Into<String>,
        subtopic: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration_days: u32,
    ) -> Self {
        Self {
            main_topic: main_topic.into(),
            subtopic: subtopic.into(),
            start_date,
            end_date,
            duration_days,
            kind: RecordKind::Work,
        }
    }

    pub fn rest(
        main_topic: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration_days: u32,
    ) -> Self {
        Self {
            main_topic: main_topic.into(),
            subtopic: BREAK_SUBTOPIC.to_string(),
            start_date,
            end_date,
            duration_days,
            kind: RecordKind::Break,
        }
    }

    pub fn is_break(&self) -> bool {
        self.kind == RecordKind::Break
    }

    pub fn display_topic(&self) -> String {
        match self.kind {
            RecordKind::Work => self.main_topic.clone(),
            RecordKind::Break => format!("{}{}", self.main_topic, BREAK_SUFFIX),
        }
    }
}

/// Report shown once a schedule has been generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_items: usize,
    pub total_calendar_days: i64,
    pub total_working_days: u64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl ScheduleSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("items={}", self.total_items));
        parts.push(format!("calendar_days={}", self.total_calendar_days));
        parts.push(format!("working_days={}", self.total_working_days));
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            parts.push(format!("span={first}..{last}"));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    records: Vec<ScheduleRecord>,
}

impl Schedule {
    pub fn new(records: Vec<ScheduleRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ScheduleRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ScheduleRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn work_records(&self) -> impl Iterator<Item = &ScheduleRecord> {
        self.records.iter().filter(|record| !record.is_break())
    }

    pub fn break_records(&self) -> impl Iterator<Item = &ScheduleRecord> {
        self.records.iter().filter(|record| record.is_break())
    }

    /// First record's start through last record's end.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.start_date, last.end_date))
    }

    pub fn summary(&self) -> ScheduleSummary {
        let span = self.span();
        let total_calendar_days = span
            .map(|(start, end)| (end - start).num_days() + 1)
            .unwrap_or(0);
        ScheduleSummary {
            total_items: self.records.len(),
            total_calendar_days,
            total_working_days: self
                .work_records()
                .map(|record| u64::from(record.duration_days))
                .sum(),
            first_date: span.map(|(start, _)| start),
            last_date: span.map(|(_, end)| end),
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let topics: Vec<String> = self.records.iter().map(ScheduleRecord::display_topic).collect();
        let subtopics: Vec<&str> = self.records.iter().map(|r| r.subtopic.as_str()).collect();
        let starts: Vec<i32> = self.records.iter().map(|r| Self::date_to_i32(r.start_date)).collect();
        let ends: Vec<i32> = self.records.iter().map(|r| Self::date_to_i32(r.end_date)).collect();
        let durations: Vec<u32> = self.records.iter().map(|r| r.duration_days).collect();
        let kinds: Vec<&str> = self.records.iter().map(|r| r.kind.as_str()).collect();

        let columns: Vec<Column> = vec![
            Series::new(PlSmallStr::from_static(COLUMN_MAIN_TOPIC), topics).into_column(),
            Series::new(PlSmallStr::from_static(COLUMN_SUBTOPIC), subtopics).into_column(),
            Series::new(PlSmallStr::from_static(COLUMN_START_DATE), starts)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static(COLUMN_END_DATE), ends)
                .cast(&DataType::Date)?
                .into_column(),
            Series::new(PlSmallStr::from_static(COLUMN_DURATION), durations).into_column(),
            Series::new(PlSmallStr::from_static(COLUMN_KIND), kinds).into_column(),
        ];
        DataFrame::new(columns)
    }

    fn date_to_i32(date: NaiveDate) -> i32 {
        date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
    }
}

impl FromIterator<ScheduleRecord> for Schedule {
    fn from_iter<T: IntoIterator<Item = ScheduleRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
