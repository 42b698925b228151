//! Holiday sets and the sources that produce them.
//!
//! The allocation engine only ever reads a [`HolidaySet`]. Everything that
//! fetches or parses holiday data lives here and degrades to an empty set on
//! failure so the engine never observes a fetch error.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Label used when a non-working date carries no name.
pub const UNNAMED_HOLIDAY: &str = "Holiday";
/// Name given to caller-supplied free days.
pub const FREE_DAY_NAME: &str = "Additional free day";

const HEBCAL_CATEGORIES: [&str; 2] = ["holiday", "roshchodesh"];

#[derive(Debug, Error)]
pub enum HolidayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid holiday feed: {0}")]
    Feed(#[from] serde_json::Error),
    #[error("invalid holiday date '{0}'")]
    InvalidDate(String),
}

pub type HolidayResult<T> = Result<T, HolidayError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    names: HashMap<NaiveDate, String>,
}

/// A caller-specified day (or inclusive run of days) with no classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FreeDay {
    Single { date: NaiveDate },
    Range { start: NaiveDate, end: NaiveDate },
}

impl FreeDay {
    /// Number of dates covered, without expanding the range.
    pub fn span_days(&self) -> u64 {
        match *self {
            FreeDay::Single { .. } => 1,
            FreeDay::Range { start, end } => (end - start).num_days().unsigned_abs() + 1,
        }
    }

    /// Dates covered, ascending. Reversed ranges are normalized.
    pub fn dates(&self) -> Vec<NaiveDate> {
        match *self {
            FreeDay::Single { date } => vec![date],
            FreeDay::Range { start, end } => {
                let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                lo.iter_days().take_while(|date| *date <= hi).collect()
            }
        }
    }
}

impl std::str::FromStr for FreeDay {
    type Err = HolidayError;

    /// Accepts `YYYY-MM-DD` or `YYYY-MM-DD..YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once("..") {
            Some((start, end)) => Ok(FreeDay::Range {
                start: parse_iso_date(start)?,
                end: parse_iso_date(end)?,
            }),
            None => Ok(FreeDay::Single {
                date: parse_iso_date(s)?,
            }),
        }
    }
}

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, name: Option<String>) {
        self.dates.insert(date);
        if let Some(name) = name {
            self.names.entry(date).or_insert(name);
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn name_of(&self, date: NaiveDate) -> Option<&str> {
        self.names.get(&date).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    /// Union another set into this one. Existing names win.
    pub fn extend(&mut self, other: HolidaySet) {
        let HolidaySet { dates, mut names } = other;
        for date in dates {
            let name = names.remove(&date);
            self.insert(date, name);
        }
    }

    pub fn add_free_days(&mut self, free_days: &[FreeDay]) {
        for free_day in free_days {
            for date in free_day.dates() {
                self.insert(date, Some(FREE_DAY_NAME.to_string()));
            }
        }
    }

    /// Holidays within `[start, end]`, ascending.
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        if start > end {
            return Vec::new();
        }
        self.dates.range(start..=end).copied().collect()
    }

    pub fn for_year(&self, year: i32) -> HolidaySet {
        let mut out = HolidaySet::new();
        for date in self.dates.iter().filter(|date| date.year() == year) {
            out.insert(*date, self.names.get(date).cloned());
        }
        out
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        let mut set = HolidaySet::new();
        for date in iter {
            set.insert(date, None);
        }
        set
    }
}

/// Anything that can report the holidays of a calendar year.
pub trait HolidaySource {
    fn holidays_for_year(&self, year: i32) -> HolidayResult<HolidaySet>;
}

/// Holidays for `start_year` and the year after.
///
/// A year that cannot be loaded contributes nothing; the failure is logged.
pub fn collect_holidays(source: &dyn HolidaySource, start_year: i32) -> HolidaySet {
    let mut holidays = HolidaySet::new();
    for year in [start_year, start_year + 1] {
        match source.holidays_for_year(year) {
            Ok(set) => {
                debug!(year, count = set.len(), "loaded holidays");
                holidays.extend(set);
            }
            Err(err) => warn!(year, error = %err, "could not load holidays, continuing without them"),
        }
    }
    holidays
}

#[derive(Debug, Deserialize)]
struct HebcalItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HebcalResponse {
    #[serde(default)]
    items: Vec<HebcalItem>,
}

/// Parser for Hebcal-format JSON holiday feeds.
pub struct HebcalFeed;

impl HebcalFeed {
    pub fn parse_str(json: &str) -> HolidayResult<HolidaySet> {
        let response: HebcalResponse = serde_json::from_str(json)?;
        Self::collect(response)
    }

    pub fn parse_reader<R: Read>(reader: R) -> HolidayResult<HolidaySet> {
        let response: HebcalResponse = serde_json::from_reader(reader)?;
        Self::collect(response)
    }

    fn collect(response: HebcalResponse) -> HolidayResult<HolidaySet> {
        let mut holidays = HolidaySet::new();
        for item in response.items {
            let wanted = item
                .category
                .as_deref()
                .is_some_and(|category| HEBCAL_CATEGORIES.contains(&category));
            if !wanted {
                continue;
            }
            let Some(raw) = item.date.as_deref() else {
                continue;
            };
            // timed events carry a suffix such as T19:00:00+03:00
            let day = raw.get(..10).unwrap_or(raw);
            holidays.insert(parse_iso_date(day)?, item.title);
        }
        Ok(holidays)
    }
}

/// Reads `<dir>/<year>.json` Hebcal feeds.
#[derive(Debug, Clone)]
pub struct HebcalDirectory {
    dir: PathBuf,
}

impl HebcalDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for_year(&self, year: i32) -> PathBuf {
        self.dir.join(format!("{year}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl HolidaySource for HebcalDirectory {
    fn holidays_for_year(&self, year: i32) -> HolidayResult<HolidaySet> {
        let file = File::open(self.path_for_year(year))?;
        HebcalFeed::parse_reader(BufReader::new(file))
    }
}

/// Source backed by an in-memory set.
#[derive(Debug, Clone, Default)]
pub struct StaticHolidaySource {
    holidays: HolidaySet,
}

impl StaticHolidaySource {
    pub fn new(holidays: HolidaySet) -> Self {
        Self { holidays }
    }
}

impl HolidaySource for StaticHolidaySource {
    fn holidays_for_year(&self, year: i32) -> HolidayResult<HolidaySet> {
        Ok(self.holidays.for_year(year))
    }
}

fn parse_iso_date(input: &str) -> HolidayResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| HolidayError::InvalidDate(input.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const FEED: &str = r#"{
        "title": "Hebcal 2025",
        "items": [
            {"title": "Pesach I", "date": "2025-04-13", "category": "holiday"},
            {"title": "Rosh Chodesh Iyyar", "date": "2025-04-28", "category": "roshchodesh"},
            {"title": "Candle lighting", "date": "2025-04-11T18:51:00+03:00", "category": "candles"},
            {"title": "Erev Shavuot", "date": "2025-06-01T19:00:00+03:00", "category": "holiday"},
            {"title": "Parashat Emor", "date": "2025-05-17", "category": "parashat"}
        ]
    }"#;

    #[test]
    fn span_days_counts_reversed_ranges_without_expanding() {
        let range = FreeDay::Range {
            start: d(2025, 1, 8),
            end: d(2025, 1, 6),
        };
        assert_eq!(range.span_days(), 3);
        assert_eq!(range.dates().len(), 3);
        let whole = FreeDay::Range {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        };
        assert!(whole.span_days() > 100_000_000);
    }

    #[test]
    fn hebcal_feed_keeps_holiday_categories_only() {
        let set = HebcalFeed::parse_str(FEED).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.name_of(d(2025, 4, 13)), Some("Pesach I"));
        assert!(set.contains(d(2025, 6, 1)));
        assert!(!set.contains(d(2025, 4, 11)));
        assert!(!set.contains(d(2025, 5, 17)));
    }

    #[test]
    fn hebcal_feed_rejects_garbled_dates() {
        let feed = r#"{"items": [{"title": "x", "date": "13/04/2025", "category": "holiday"}]}"#;
        assert!(matches!(
            HebcalFeed::parse_str(feed),
            Err(HolidayError::InvalidDate(_))
        ));
    }

    #[test]
    fn free_day_ranges_are_inclusive_and_normalized() {
        let range: FreeDay = "2025-03-05..2025-03-03".parse().unwrap();
        assert_eq!(range.dates(), vec![d(2025, 3, 3), d(2025, 3, 4), d(2025, 3, 5)]);

        let mut set = HolidaySet::new();
        set.insert(d(2025, 3, 4), Some("Purim".into()));
        set.add_free_days(&[range, "2025-03-10".parse().unwrap()]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.name_of(d(2025, 3, 4)), Some("Purim"));
        assert_eq!(set.name_of(d(2025, 3, 10)), Some(FREE_DAY_NAME));
    }

    struct Flaky;

    impl HolidaySource for Flaky {
        fn holidays_for_year(&self, year: i32) -> HolidayResult<HolidaySet> {
            if year == 2026 {
                return Err(HolidayError::InvalidDate("offline".into()));
            }
            Ok(HolidaySet::from_iter([d(year, 9, 23)]))
        }
    }

    #[test]
    fn collect_holidays_degrades_per_year() {
        let set = collect_holidays(&Flaky, 2025);
        assert_eq!(set.dates().collect::<Vec<_>>(), vec![d(2025, 9, 23)]);
    }

    #[test]
    fn static_source_filters_by_year() {
        let source = StaticHolidaySource::new(HolidaySet::from_iter([
            d(2024, 12, 31),
            d(2025, 1, 1),
        ]));
        let set = source.holidays_for_year(2025).unwrap();
        assert_eq!(set.dates().collect::<Vec<_>>(), vec![d(2025, 1, 1)]);
    }
}
