//! punchboard-core - Core library for punchboard
//!
//! Date-range resolution, attendance aggregation, per-category rankings,
//! summary percentages and the single-employee drill-down, plus the store
//! that drives them from a record source.

pub mod analytics;
pub mod classify;
pub mod config;
pub mod drilldown;
pub mod error;
pub mod event;
pub mod export;
pub mod models;
pub mod paginate;
pub mod range;
pub mod source;
pub mod store;

pub use analytics::{DashboardSnapshot, Summary};
pub use classify::ArrivalPolicy;
pub use config::PunchboardConfig;
pub use drilldown::{CategoryFilter, DateWindow, DetailPage, DrillDownState};
pub use error::{CoreError, LoadReport};
pub use event::{DashboardEvent, EventBus};
pub use export::{export_rankings_to_csv, export_records_to_csv, export_snapshot_to_json};
pub use models::{AttendanceRecord, Category, EmployeeId};
pub use range::{Anchors, DateRange, Granularity};
pub use source::{Dataset, DatasetParser, DepartmentDirectory, RecordFilter, RecordSource};
pub use store::{DashboardParams, DashboardStore, LoadOutcome, View};
