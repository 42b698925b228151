use super::{PersistenceError, PersistenceResult};
use crate::planner::PlanOutcome;
use crate::schedule::{BREAK_SUBTOPIC, BREAK_SUFFIX, Schedule, ScheduleRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct ScheduleCsvRecord {
    #[serde(rename = "Main Topic")]
    main_topic: String,
    #[serde(rename = "Subtopic")]
    subtopic: String,
    #[serde(rename = "Start Date")]
    start_date: String,
    #[serde(rename = "End Date")]
    end_date: String,
    #[serde(rename = "Duration (Days)")]
    duration_days: u32,
}

impl From<&ScheduleRecord> for ScheduleCsvRecord {
    fn from(record: &ScheduleRecord) -> Self {
        Self {
            main_topic: record.display_topic(),
            subtopic: record.subtopic.clone(),
            start_date: format_date(record.start_date),
            end_date: format_date(record.end_date),
            duration_days: record.duration_days,
        }
    }
}

impl ScheduleCsvRecord {
    /// Exported files mark breaks only through their labels.
    fn into_record(self) -> PersistenceResult<ScheduleRecord> {
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;
        match self.main_topic.strip_suffix(BREAK_SUFFIX) {
            Some(topic) if self.subtopic == BREAK_SUBTOPIC => Ok(ScheduleRecord::rest(
                topic,
                start,
                end,
                self.duration_days,
            )),
            _ => Ok(ScheduleRecord::work(
                self.main_topic,
                self.subtopic,
                start,
                end,
                self.duration_days,
            )),
        }
    }
}

pub fn write_schedule_csv<W: Write>(schedule: &Schedule, writer: W) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in schedule.records() {
        writer.serialize(ScheduleCsvRecord::from(record))?;
    }
    if schedule.is_empty() {
        writer.write_record([
            "Main Topic",
            "Subtopic",
            "Start Date",
            "End Date",
            "Duration (Days)",
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn schedule_to_csv_string(schedule: &Schedule) -> PersistenceResult<String> {
    let mut buffer = Vec::new();
    write_schedule_csv(schedule, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(schedule: &Schedule, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_schedule_csv(schedule, file)
}

pub fn read_schedule_csv<R: Read>(reader: R) -> PersistenceResult<Schedule> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in reader.deserialize::<ScheduleCsvRecord>() {
        records.push(row?.into_record()?);
    }
    Ok(Schedule::new(records))
}

pub fn load_schedule_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    read_schedule_csv(file)
}

pub fn save_outcome_to_json<P: AsRef<Path>>(outcome: &PlanOutcome, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, outcome)?;
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::RecordKind;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn csv_uses_display_labels_and_iso_dates() {
        let schedule = Schedule::new(vec![
            ScheduleRecord::work("Intro", "Basics", d(2025, 1, 5), d(2025, 1, 7), 3),
            ScheduleRecord::rest("Intro", d(2025, 1, 8), d(2025, 1, 12), 2),
        ]);
        let csv = schedule_to_csv_string(&schedule).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Main Topic,Subtopic,Start Date,End Date,Duration (Days)");
        assert_eq!(lines[1], "Intro,Basics,2025-01-05,2025-01-07,3");
        assert_eq!(lines[2], "Intro - Break,Break Period,2025-01-08,2025-01-12,2");

        let parsed = read_schedule_csv(csv.as_bytes()).unwrap();
        assert_eq!(parsed.records()[1].kind, RecordKind::Break);
        assert_eq!(parsed.records()[1].main_topic, "Intro");
    }

    #[test]
    fn empty_schedule_still_writes_header() {
        let csv = schedule_to_csv_string(&Schedule::default()).unwrap();
        assert_eq!(csv.trim_end(), "Main Topic,Subtopic,Start Date,End Date,Duration (Days)");
    }

    #[test]
    fn bad_dates_are_reported() {
        let input = "Main Topic,Subtopic,Start Date,End Date,Duration (Days)\nA,a,05/01/2025,2025-01-05,1\n";
        assert!(matches!(
            read_schedule_csv(input.as_bytes()),
            Err(PersistenceError::InvalidData(_))
        ));
    }
}
