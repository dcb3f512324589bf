//! Count and percentage models derived from attendance records
//!
//! All of these are rebuilt from scratch on every aggregation pass.

use serde::{Deserialize, Serialize};

use super::record::{Category, EmployeeId};

/// Sentinel department for employees the directory does not know
pub const NO_DEPARTMENT: &str = "No Department";

/// Per-category record counts
///
/// `unrecognized` holds records whose tag is none of the four known
/// categories; it feeds totals only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub present: u64,
    pub late: u64,
    pub sick: u64,
    pub unpaid: u64,
    pub unrecognized: u64,
}

impl CategoryCounts {
    pub fn record(&mut self, category: &Category) {
        match category {
            Category::Present => self.present += 1,
            Category::Late => self.late += 1,
            Category::Sick => self.sick += 1,
            Category::Unpaid => self.unpaid += 1,
            Category::Other(_) => self.unrecognized += 1,
        }
    }

    /// Count for a named bucket (0 for unrecognized tags)
    pub fn get(&self, category: &Category) -> u64 {
        match category {
            Category::Present => self.present,
            Category::Late => self.late,
            Category::Sick => self.sick,
            Category::Unpaid => self.unpaid,
            Category::Other(_) => 0,
        }
    }

    /// Present-or-late count backing the composite attendance metric
    pub fn attended(&self) -> u64 {
        self.present + self.late
    }

    pub fn total(&self) -> u64 {
        self.present + self.late + self.sick + self.unpaid + self.unrecognized
    }

    /// Per-record percentages with one decimal, present folding in late
    pub fn percentages(&self) -> CategoryPercentages {
        let total = self.total();
        CategoryPercentages {
            present: round1(percent(self.attended(), total)),
            late: round1(percent(self.late, total)),
            sick: round1(percent(self.sick, total)),
            unpaid: round1(percent(self.unpaid, total)),
        }
    }
}

/// Running totals for one employee within one aggregation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAccumulator {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub department_name: String,
    pub counts: CategoryCounts,
    pub total: u64,
}

impl EmployeeAccumulator {
    pub fn new(employee_id: EmployeeId, employee_name: impl Into<String>) -> Self {
        Self {
            employee_id,
            employee_name: employee_name.into(),
            department_name: NO_DEPARTMENT.to_string(),
            counts: CategoryCounts::default(),
            total: 0,
        }
    }

    pub fn add(&mut self, category: &Category) {
        self.counts.record(category);
        self.total += 1;
    }
}

/// One row of a ranked category list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub department_name: String,
    /// 0-100, one decimal place
    pub percentage: f64,
}

/// Percentages for the four named categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPercentages {
    pub present: f64,
    pub late: f64,
    pub sick: f64,
    pub unpaid: f64,
}

impl CategoryPercentages {
    pub fn get(&self, category: &Category) -> f64 {
        match category {
            Category::Present => self.present,
            Category::Late => self.late,
            Category::Sick => self.sick,
            Category::Unpaid => self.unpaid,
            Category::Other(_) => 0.0,
        }
    }
}

/// `part / total * 100`, or 0 when there is nothing to divide by
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_total_includes_unrecognized() {
        let mut counts = CategoryCounts::default();
        counts.record(&Category::Present);
        counts.record(&Category::Late);
        counts.record(&Category::Other("remote".into()));

        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(&Category::Other("remote".into())), 0);
        assert_eq!(counts.unrecognized, 1);
    }

    #[test]
    fn test_percent_guards_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(CategoryCounts::default().percentages(), CategoryPercentages::default());
    }

    #[test]
    fn test_percentages_fold_late_into_present() {
        let counts = CategoryCounts {
            present: 1,
            late: 1,
            sick: 1,
            unpaid: 0,
            unrecognized: 0,
        };
        let pct = counts.percentages();
        assert_eq!(pct.present, 66.7);
        assert_eq!(pct.late, 33.3);
        assert_eq!(pct.sick, 33.3);
        assert_eq!(pct.unpaid, 0.0);
    }

    #[test]
    fn test_accumulator_total_matches_counts() {
        let mut acc = EmployeeAccumulator::new(1, "Ana");
        for category in [Category::Present, Category::Sick, Category::Other("x".into())] {
            acc.add(&category);
        }
        assert_eq!(acc.total, acc.counts.total());
        assert_eq!(acc.department_name, NO_DEPARTMENT);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round2(33.3333), 33.33);
    }
}
