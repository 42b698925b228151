pub mod calculations;
pub mod calendar;
pub mod holidays;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod planner;
pub mod schedule;
pub mod settings;
pub mod syllabus;

pub use calculations::{
    AllocationConfig, BreakInserter, ExamProjection, HolidayEntry, ScheduleAllocator,
    ScheduleStatistics, StatisticsEngine,
};
pub use calendar::{CalendarError, WorkCalendar, WorkCalendarConfig};
pub use holidays::{
    FreeDay, HebcalDirectory, HebcalFeed, HolidayError, HolidaySet, HolidaySource,
    StaticHolidaySource, collect_holidays,
};
pub use persistence::{
    PersistenceError, load_schedule_from_csv, read_schedule_csv, save_outcome_to_json,
    save_schedule_to_csv, schedule_to_csv_string, write_schedule_csv,
};
pub use planner::{PlanError, PlanOutcome, Planner};
pub use schedule::{RecordKind, Schedule, ScheduleRecord, ScheduleSummary};
pub use settings::PlanSettings;
pub use syllabus::{
    EmptyDaysPolicy, LoadedSyllabus, SyllabusError, SyllabusOverview, SyllabusRow,
    load_syllabus_from_csv, read_syllabus,
};
