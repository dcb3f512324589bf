//! Per-employee ranking for one category

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::stats::{percent, round1};
use crate::models::{Category, EmployeeAccumulator, EmployeeId, RankingEntry};

/// Default list length on the dashboard
pub const DEFAULT_TOP_N: usize = 10;

/// Top-N lists for the four named categories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRankings {
    pub present: Vec<RankingEntry>,
    pub late: Vec<RankingEntry>,
    pub sick: Vec<RankingEntry>,
    pub unpaid: Vec<RankingEntry>,
}

impl CategoryRankings {
    pub fn compute(per_employee: &BTreeMap<EmployeeId, EmployeeAccumulator>, top_n: usize) -> Self {
        Self {
            present: rank(per_employee, &Category::Present, top_n),
            late: rank(per_employee, &Category::Late, top_n),
            sick: rank(per_employee, &Category::Sick, top_n),
            unpaid: rank(per_employee, &Category::Unpaid, top_n),
        }
    }

    pub fn get(&self, category: &Category) -> &[RankingEntry] {
        match category {
            Category::Present => &self.present,
            Category::Late => &self.late,
            Category::Sick => &self.sick,
            Category::Unpaid => &self.unpaid,
            Category::Other(_) => &[],
        }
    }

    /// (category, list) pairs in dashboard order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[RankingEntry])> {
        Category::KNOWN
            .into_iter()
            .map(move |category| {
                let list = self.get(&category);
                (category, list)
            })
    }
}

/// Rank employees for `category`, highest percentage first
///
/// Percentage is the category's share of the employee's records, rounded to
/// one decimal. `present` is the composite present-or-late share, and an
/// employee qualifies for it with either count above zero. Everyone else
/// needs a non-zero count in the category. Ties keep the map's ascending-id
/// order; the sort is stable and has no secondary key.
pub fn rank(
    per_employee: &BTreeMap<EmployeeId, EmployeeAccumulator>,
    category: &Category,
    top_n: usize,
) -> Vec<RankingEntry> {
    if !category.is_known() {
        return Vec::new();
    }

    let mut candidates: Vec<RankingEntry> = per_employee
        .values()
        .filter_map(|acc| {
            let count = match category {
                Category::Present => acc.counts.attended(),
                other => acc.counts.get(other),
            };
            if count == 0 {
                return None;
            }
            Some(RankingEntry {
                employee_id: acc.employee_id,
                employee_name: acc.employee_name.clone(),
                department_name: acc.department_name.clone(),
                percentage: round1(percent(count, acc.total)),
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    candidates.truncate(top_n);
    candidates
}
