use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const MAIN_TOPIC_COLUMN: &str = "Main Topic";
pub const SUBTOPIC_COLUMN: &str = "Subtopic";
pub const DAYS_COLUMN: &str = "Days";

const REQUIRED_COLUMNS: [&str; 3] = [MAIN_TOPIC_COLUMN, SUBTOPIC_COLUMN, DAYS_COLUMN];

/// One line of a syllabus: a subtopic of a main topic and the working days it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusRow {
    pub main_topic: String,
    pub subtopic: String,
    pub days_needed: u32,
}

impl SyllabusRow {
    pub fn new(main_topic: impl Into<String>, subtopic: impl Into<String>, days_needed: u32) -> Self {
        Self {
            main_topic: main_topic.into(),
            subtopic: subtopic.into(),
            days_needed,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyllabusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("the syllabus contains no rows")]
    Empty,
    #[error("invalid value '{value}' in 'Days' column for subtopic '{subtopic}' (row {row})")]
    InvalidDays {
        row: usize,
        subtopic: String,
        value: String,
    },
    #[error("found {count} empty value(s) in the 'Days' column")]
    EmptyDays { count: usize },
}

pub type SyllabusResult<T> = Result<T, SyllabusError>;

/// What to do with blank `Days` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDaysPolicy {
    Reject,
    Fill(u32),
}

impl Default for EmptyDaysPolicy {
    fn default() -> Self {
        EmptyDaysPolicy::Fill(1)
    }
}

/// Preview metrics for a loaded syllabus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusOverview {
    pub main_topics: usize,
    pub subtopics: usize,
    pub total_days: u64,
    pub empty_values: usize,
}

impl SyllabusOverview {
    pub fn from_rows(rows: &[SyllabusRow], empty_values: usize) -> Self {
        let topics: HashSet<&str> = rows.iter().map(|row| row.main_topic.as_str()).collect();
        Self {
            main_topics: topics.len(),
            subtopics: rows.len(),
            total_days: rows.iter().map(|row| u64::from(row.days_needed)).sum(),
            empty_values,
        }
    }

    pub fn to_cli_summary(&self) -> String {
        format!(
            "main topics={}, subtopics={}, total days={}, empty values={}",
            self.main_topics, self.subtopics, self.total_days, self.empty_values
        )
    }
}

/// Rows plus how many blank `Days` cells were filled on the way in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSyllabus {
    pub rows: Vec<SyllabusRow>,
    pub filled_empty_days: usize,
}

impl LoadedSyllabus {
    pub fn overview(&self) -> SyllabusOverview {
        SyllabusOverview::from_rows(&self.rows, self.filled_empty_days)
    }
}

pub fn load_syllabus_from_csv<P: AsRef<Path>>(
    path: P,
    policy: EmptyDaysPolicy,
) -> SyllabusResult<LoadedSyllabus> {
    let file = File::open(path)?;
    read_syllabus(file, policy)
}

pub fn read_syllabus<R: Read>(reader: R, policy: EmptyDaysPolicy) -> SyllabusResult<LoadedSyllabus> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let indices = (
        position(MAIN_TOPIC_COLUMN),
        position(SUBTOPIC_COLUMN),
        position(DAYS_COLUMN),
    );
    let (Some(topic_idx), Some(subtopic_idx), Some(days_idx)) = indices else {
        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(**name).is_none())
            .map(|name| name.to_string())
            .collect();
        return Err(SyllabusError::MissingColumns(missing));
    };

    let mut parsed: Vec<(String, String, Option<u32>)> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();
        let subtopic = cell(subtopic_idx);
        let raw_days = cell(days_idx);
        // header is line 1
        let days = parse_days(&raw_days).map_err(|value| SyllabusError::InvalidDays {
            row: idx + 2,
            subtopic: subtopic.clone(),
            value,
        })?;
        parsed.push((cell(topic_idx), subtopic, days));
    }

    if parsed.is_empty() {
        return Err(SyllabusError::Empty);
    }

    let empty = parsed.iter().filter(|(_, _, days)| days.is_none()).count();
    let fill = match policy {
        EmptyDaysPolicy::Reject if empty > 0 => {
            return Err(SyllabusError::EmptyDays { count: empty });
        }
        EmptyDaysPolicy::Reject => 0,
        EmptyDaysPolicy::Fill(default) => default,
    };
    if empty > 0 {
        info!(count = empty, default_days = fill, "filled empty values in 'Days' column");
    }

    let rows = parsed
        .into_iter()
        .map(|(main_topic, subtopic, days)| SyllabusRow {
            main_topic,
            subtopic,
            days_needed: days.unwrap_or(fill),
        })
        .collect();

    Ok(LoadedSyllabus {
        rows,
        filled_empty_days: empty,
    })
}

/// `Ok(None)` for a blank cell; `Err(raw)` for anything but a whole non-negative number.
fn parse_days(raw: &str) -> Result<Option<u32>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    if let Ok(days) = trimmed.parse::<u32>() {
        return Ok(Some(days));
    }
    match trimmed.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value <= f64::from(u32::MAX) =>
        {
            Ok(Some(value as u32))
        }
        _ => Err(trimmed.to_string()),
    }
}
