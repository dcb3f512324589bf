//! Attendance analytics for the dashboard view
//!
//! Aggregates punch records per employee, ranks employees per category and
//! computes overall category percentages for one date window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{AttendanceRecord, EmployeeId};
use crate::range::DateRange;

pub mod aggregate;
pub mod ranking;
pub mod summary;


pub use aggregate::{aggregate, employee_ids, Aggregation};
pub use ranking::{rank, CategoryRankings, DEFAULT_TOP_N};
pub use summary::{summarize, Summary};

/// Everything the dashboard renders for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Window the records were fetched for
    pub range: DateRange,
    /// Overall percentages including the composite attendance metric
    pub summary: Summary,
    /// Top-N per category
    pub rankings: CategoryRankings,
    pub employee_count: usize,
    pub record_count: usize,
    /// Timestamp of computation
    pub computed_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Run aggregation, ranking and summary over one fetched record set
    ///
    /// Pure apart from `computed_at`; re-running on the same input yields the
    /// same lists and percentages.
    pub fn compute(
        records: &[AttendanceRecord],
        departments: &HashMap<EmployeeId, String>,
        range: DateRange,
        top_n: usize,
    ) -> Self {
        let aggregation = aggregate(records, departments);
        let rankings = CategoryRankings::compute(&aggregation.per_employee, top_n);
        let summary = summarize(&aggregation.totals, aggregation.grand_total);

        Self {
            range,
            summary,
            rankings,
            employee_count: aggregation.employee_count(),
            record_count: records.len(),
            computed_at: Utc::now(),
        }
    }

    /// Placeholder shown before the first successful load
    pub fn empty(range: DateRange) -> Self {
        Self::compute(&[], &HashMap::new(), range, DEFAULT_TOP_N)
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}
