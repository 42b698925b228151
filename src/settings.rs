use crate::calculations::{AllocationConfig, DEFAULT_EXAM_KEYWORDS};
use crate::calendar::WorkCalendarConfig;
use crate::holidays::FreeDay;
use crate::syllabus::EmptyDaysPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Upper bound on a single break, in working days.
pub const MAX_BREAK_DAYS: u32 = 366;

/// Upper bound on the calendar days one free-day range may cover.
pub const MAX_FREE_DAY_SPAN: u32 = 366;

/// Upper bound on the working days a single syllabus row may ask for.
pub const MAX_ROW_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSettings {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub add_break: bool,
    #[serde(default = "default_break_days")]
    pub break_days: u32,
    #[serde(default = "default_true")]
    pub consider_holidays: bool,
    #[serde(default)]
    pub free_days: Vec<FreeDay>,
    #[serde(default = "default_exam_keywords")]
    pub exam_keywords: Vec<String>,
    #[serde(default)]
    pub empty_days: EmptyDaysPolicy,
    #[serde(default)]
    pub calendar: WorkCalendarConfig,
}

fn default_break_days() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_exam_keywords() -> Vec<String> {
    DEFAULT_EXAM_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl PlanSettings {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            add_break: false,
            break_days: default_break_days(),
            consider_holidays: true,
            free_days: Vec::new(),
            exam_keywords: default_exam_keywords(),
            empty_days: EmptyDaysPolicy::default(),
            calendar: WorkCalendarConfig::default(),
        }
    }

    pub fn allocation(&self) -> AllocationConfig {
        AllocationConfig {
            add_break: self.add_break,
            break_days: self.break_days,
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, serde_json::Error> {
        let file = File::open(path).map_err(serde_json::Error::io)?;
        serde_json::from_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let settings: PlanSettings = serde_json::from_str(r#"{"start_date": "2025-01-05"}"#).unwrap();
        assert_eq!(settings, PlanSettings::new(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()));
        assert!(!settings.allocation().breaks_enabled());
    }

    #[test]
    fn free_days_deserialize_from_tagged_json() {
        let settings: PlanSettings = serde_json::from_str(
            r#"{
                "start_date": "2025-01-05",
                "add_break": true,
                "free_days": [
                    {"kind": "single", "date": "2025-02-10"},
                    {"kind": "range", "start": "2025-03-01", "end": "2025-03-03"}
                ],
                "empty_days": {"fill": 2}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.free_days.len(), 2);
        assert_eq!(settings.empty_days, EmptyDaysPolicy::Fill(2));
        assert!(settings.allocation().breaks_enabled());
    }
}
