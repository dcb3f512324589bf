//! Data models for punchboard

pub mod record;
pub mod stats;

pub use record::{canonical_name, AttendanceRecord, Category, EmployeeId, DISPLAY_FORMAT};
pub use stats::{
    CategoryCounts, CategoryPercentages, EmployeeAccumulator, RankingEntry, NO_DEPARTMENT,
};
