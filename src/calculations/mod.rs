pub mod allocation;
pub mod breaks;
pub mod statistics;

pub use allocation::{AllocationConfig, ScheduleAllocator};
pub use breaks::BreakInserter;
pub use statistics::{
    DEFAULT_EXAM_KEYWORDS, ExamProjection, HolidayEntry, ScheduleStatistics, StatisticsEngine,
};
