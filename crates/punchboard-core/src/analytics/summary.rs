//! Population-level category percentages
//!
//! These are shares of all matching records, not averages of the
//! per-employee percentages used for ranking.

use serde::{Deserialize, Serialize};

use crate::models::stats::{percent, round2};
use crate::models::{Category, CategoryCounts};

/// Overall percentages, two decimal places
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub present: f64,
    pub late: f64,
    pub sick: f64,
    pub unpaid: f64,
    /// Composite present-or-late share
    pub attendance: f64,
    pub grand_total: u64,
}

impl Summary {
    pub fn get(&self, category: &Category) -> f64 {
        match category {
            Category::Present => self.present,
            Category::Late => self.late,
            Category::Sick => self.sick,
            Category::Unpaid => self.unpaid,
            Category::Other(_) => 0.0,
        }
    }

    /// Sum of the four plain category shares
    pub fn category_sum(&self) -> f64 {
        self.present + self.late + self.sick + self.unpaid
    }
}

pub fn summarize(totals: &CategoryCounts, grand_total: u64) -> Summary {
    Summary {
        present: round2(percent(totals.present, grand_total)),
        late: round2(percent(totals.late, grand_total)),
        sick: round2(percent(totals.sick, grand_total)),
        unpaid: round2(percent(totals.unpaid, grand_total)),
        attendance: round2(percent(totals.attended(), grand_total)),
        grand_total,
    }
}
