//! Single-employee drill-down: independent date/category filtering and paging
//!
//! The full record set is fetched once per employee selection and never
//! mutated. Every filter change re-derives the filtered list and stats from
//! that snapshot, so repeated changes cannot drift.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{
    canonical_name, AttendanceRecord, Category, CategoryCounts, CategoryPercentages, EmployeeId,
};
use crate::paginate::{Page, Paginator};
use crate::range::DateRange;

/// Date filter of the detail view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateWindow {
    /// No date filtering
    #[default]
    All,
    Range(DateRange),
}

impl DateWindow {
    pub fn matches(&self, record: &AttendanceRecord, tz: &FixedOffset) -> bool {
        match self {
            DateWindow::All => true,
            DateWindow::Range(range) => range.contains(record.check_in_date(tz)),
        }
    }
}

impl From<Option<DateRange>> for DateWindow {
    fn from(range: Option<DateRange>) -> Self {
        range.map(DateWindow::Range).unwrap_or_default()
    }
}

/// Category filter of the detail view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// "all" (or empty) disables filtering, anything else is a category tag
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "all" => CategoryFilter::All,
            tag => CategoryFilter::Only(Category::parse(tag)),
        }
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => &record.category == category,
        }
    }
}

/// Counts and percentages over the filtered subset
///
/// Same formula as the dashboard ranking: present folds in late, denominator
/// is the filtered record count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillDownStats {
    pub counts: CategoryCounts,
    pub percentages: CategoryPercentages,
    pub total: u64,
}

impl DrillDownStats {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut counts = CategoryCounts::default();
        for record in records {
            counts.record(&record.category);
        }
        Self {
            counts,
            percentages: counts.percentages(),
            total: counts.total(),
        }
    }
}

/// Apply the detail filters to one employee's full record set
///
/// Dates compare on the check-in's calendar date in `tz`; time of day is
/// ignored. Order of `full` is preserved.
pub fn filter(
    full: &[AttendanceRecord],
    window: &DateWindow,
    category: &CategoryFilter,
    tz: &FixedOffset,
) -> (Vec<AttendanceRecord>, DrillDownStats) {
    let filtered: Vec<AttendanceRecord> = full
        .iter()
        .filter(|r| window.matches(r, tz) && category.matches(r))
        .cloned()
        .collect();
    let stats = DrillDownStats::from_records(&filtered);
    (filtered, stats)
}

/// Owned copy of what the detail view renders for the current page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailPage {
    pub employee_id: EmployeeId,
    pub employee_name: Option<String>,
    pub window: DateWindow,
    pub category: CategoryFilter,
    pub stats: DrillDownStats,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub records: Vec<AttendanceRecord>,
}

/// Live state of the employee detail view
#[derive(Debug, Clone)]
pub struct DrillDownState {
    employee_id: EmployeeId,
    employee_name: Option<String>,
    full: Arc<[AttendanceRecord]>,
    window: DateWindow,
    category: CategoryFilter,
    filtered: Vec<AttendanceRecord>,
    stats: DrillDownStats,
    pager: Paginator,
    tz: FixedOffset,
}

impl DrillDownState {
    /// Start a detail view with no filters on page 1
    pub fn new(
        employee_id: EmployeeId,
        records: Vec<AttendanceRecord>,
        page_size: usize,
        tz: FixedOffset,
    ) -> Self {
        let employee_name =
            canonical_name(records.iter().map(|r| r.employee_name.as_str())).map(str::to_owned);
        let mut state = Self {
            employee_id,
            employee_name,
            full: records.into(),
            window: DateWindow::All,
            category: CategoryFilter::All,
            filtered: Vec::new(),
            stats: DrillDownStats::default(),
            pager: Paginator::new(page_size),
            tz,
        };
        state.refilter();
        state
    }

    fn refilter(&mut self) {
        let (filtered, stats) = filter(&self.full, &self.window, &self.category, &self.tz);
        self.filtered = filtered;
        self.stats = stats;
        self.pager.reset();

        tracing::debug!(
            employee_id = self.employee_id,
            full = self.full.len(),
            filtered = self.filtered.len(),
            "Drill-down filters applied"
        );
    }

    pub fn set_window(&mut self, window: DateWindow) {
        self.window = window;
        self.refilter();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category = category;
        self.refilter();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pager.set_page_size(page_size);
    }

    pub fn next_page(&mut self) -> bool {
        self.pager.next_page(self.filtered.len())
    }

    pub fn prev_page(&mut self) -> bool {
        self.pager.prev_page()
    }

    pub fn goto_page(&mut self, page_index: usize) {
        self.pager.goto_page(page_index, self.filtered.len());
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// Name as carried by the first fetched record, if any
    pub fn employee_name(&self) -> Option<&str> {
        self.employee_name.as_deref()
    }

    pub fn full_records(&self) -> &[AttendanceRecord] {
        &self.full
    }

    pub fn filtered_records(&self) -> &[AttendanceRecord] {
        &self.filtered
    }

    pub fn stats(&self) -> &DrillDownStats {
        &self.stats
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    pub fn category(&self) -> &CategoryFilter {
        &self.category
    }

    pub fn page_index(&self) -> usize {
        self.pager.page_index()
    }

    pub fn page_size(&self) -> usize {
        self.pager.page_size()
    }

    pub fn timezone(&self) -> &FixedOffset {
        &self.tz
    }

    pub fn current_page(&self) -> Page<'_, AttendanceRecord> {
        self.pager.page(&self.filtered)
    }

    pub fn detail_page(&self) -> DetailPage {
        let page = self.current_page();
        DetailPage {
            employee_id: self.employee_id,
            employee_name: self.employee_name.clone(),
            window: self.window,
            category: self.category.clone(),
            stats: self.stats,
            page_index: page.page_index,
            page_size: self.pager.page_size(),
            total_pages: page.total_pages,
            total_items: page.total_items,
            records: page.items.to_vec(),
        }
    }
}
