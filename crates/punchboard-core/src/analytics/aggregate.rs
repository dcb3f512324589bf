//! Grouping of raw punch records by employee and category

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{
    canonical_name, AttendanceRecord, CategoryCounts, EmployeeAccumulator, EmployeeId,
};

/// Result of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Accumulators keyed by employee id (ascending id order)
    pub per_employee: BTreeMap<EmployeeId, EmployeeAccumulator>,
    /// Population-level counts over every record in the pass
    pub totals: CategoryCounts,
    /// Number of records seen, unrecognized tags included
    pub grand_total: u64,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.grand_total == 0
    }

    pub fn employee_count(&self) -> usize {
        self.per_employee.len()
    }
}

/// Distinct employee ids present in `records`, for the directory lookup
pub fn employee_ids(records: &[AttendanceRecord]) -> BTreeSet<EmployeeId> {
    records.iter().map(|r| r.employee_id).collect()
}

/// Group records by employee and category
///
/// Employees missing from `departments` get the "No Department" sentinel.
/// When one id carries several names the smallest one is kept, so the
/// accumulators do not depend on record order.
pub fn aggregate(
    records: &[AttendanceRecord],
    departments: &HashMap<EmployeeId, String>,
) -> Aggregation {
    let mut per_employee: BTreeMap<EmployeeId, EmployeeAccumulator> = BTreeMap::new();
    let mut totals = CategoryCounts::default();

    for record in records {
        let acc = per_employee.entry(record.employee_id).or_insert_with(|| {
            let mut acc = EmployeeAccumulator::new(record.employee_id, &record.employee_name);
            if let Some(dept) = departments.get(&record.employee_id) {
                acc.department_name = dept.clone();
            }
            acc
        });

        if canonical_name([acc.employee_name.as_str(), record.employee_name.as_str()])
            != Some(acc.employee_name.as_str())
        {
            acc.employee_name = record.employee_name.clone();
        }

        acc.add(&record.category);
        totals.record(&record.category);
    }

    let grand_total = totals.total();

    tracing::debug!(
        records = records.len(),
        employees = per_employee.len(),
        unrecognized = totals.unrecognized,
        "Aggregated attendance records"
    );

    Aggregation {
        per_employee,
        totals,
        grand_total,
    }
}
