//! CLI helpers: period arguments, errors and table/JSON formatters
//!
//! Everything here is pure so the commands in main.rs stay thin.

use chrono::{Datelike, FixedOffset, NaiveDate};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use punchboard_core::classify::display_label;
use punchboard_core::error::CoreError;
use punchboard_core::models::{Category, EmployeeId, RankingEntry};
use punchboard_core::{
    Anchors, DashboardParams, DashboardSnapshot, DateRange, DateWindow, DetailPage, Granularity,
};
use serde_json::json;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    UnknownEmployee {
        employee_id: EmployeeId,
        scanned: usize,
    },
    InvalidArgument(String),
    Core(CoreError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::UnknownEmployee {
                employee_id,
                scanned,
            } => {
                write!(
                    f,
                    "No records for employee {} ({} records scanned)",
                    employee_id, scanned
                )
            }
            CliError::InvalidArgument(message) => write!(f, "{}", message),
            CliError::Core(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        CliError::Core(e)
    }
}

impl CliError {
    /// True when different arguments would fix it
    pub fn is_user_input(&self) -> bool {
        match self {
            CliError::UnknownEmployee { .. } | CliError::InvalidArgument(_) => true,
            CliError::Core(e) => e.is_user_input(),
        }
    }
}

/// Exit code for a failed command: 2 for bad input, 1 for everything else
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let user_input = err.chain().any(|cause| {
        cause
            .downcast_ref::<CliError>()
            .map(CliError::is_user_input)
            .or_else(|| cause.downcast_ref::<CoreError>().map(CoreError::is_user_input))
            .unwrap_or(false)
    });
    if user_input {
        2
    } else {
        1
    }
}

// ============================================================================
// Period Arguments
// ============================================================================

/// Window selection shared by every command
#[derive(Debug, Clone, Args)]
pub struct PeriodArgs {
    /// day|week|month|quarter|year (employee also accepts "all")
    #[arg(long, short = 'p')]
    pub period: Option<String>,

    /// Anchor year (default: current)
    #[arg(long)]
    pub year: Option<i32>,

    /// Anchor month 1-12 (default: current)
    #[arg(long)]
    pub month: Option<u32>,

    /// Anchor quarter 1-4 (default: current)
    #[arg(long)]
    pub quarter: Option<u32>,

    /// Anchor day for day/week periods, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub day: Option<NaiveDate>,

    /// Explicit window start, YYYY-MM-DD; clamped to the period's maximum span
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Explicit window end, YYYY-MM-DD (default: today)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

impl PeriodArgs {
    fn granularity(&self, default: &str) -> Result<Granularity, CliError> {
        self.period
            .as_deref()
            .unwrap_or(default)
            .parse()
            .map_err(CliError::InvalidArgument)
    }

    /// Dashboard parameters; anchors the user left out come from `today`
    ///
    /// Explicit anchors are passed through unchecked so out-of-range values
    /// surface as an invalid-anchor error.
    pub fn params(&self, today: NaiveDate) -> Result<DashboardParams, CliError> {
        let granularity = self.granularity("month")?;

        if let Some(from) = self.from {
            let to = self.to.unwrap_or(today);
            return Ok(DashboardParams::custom(granularity, DateRange::new(from, to)));
        }

        let anchors = Anchors {
            year: Some(self.year.unwrap_or(today.year())),
            month: Some(self.month.unwrap_or(today.month())),
            quarter: Some(self.quarter.unwrap_or((today.month() - 1) / 3 + 1)),
            day: Some(self.day.unwrap_or(today)),
        };
        Ok(DashboardParams::new(granularity, anchors))
    }

    /// Drill-down date window; no period means the whole history
    pub fn window(&self, today: NaiveDate) -> Result<DateWindow, CliError> {
        match self.period.as_deref() {
            None | Some("all") if self.from.is_none() => Ok(DateWindow::All),
            None | Some("all") => {
                let from = self.from.unwrap_or(today);
                Ok(DateWindow::Range(DateRange::new(from, self.to.unwrap_or(today))))
            }
            Some(_) => Ok(DateWindow::Range(self.params(today)?.resolve()?)),
        }
    }
}

/// Parse a `--category` value; "all" means no filter
pub fn parse_category(raw: &str) -> Result<Option<Category>, CliError> {
    match raw.trim() {
        "all" => Ok(None),
        tag => match Category::parse(tag) {
            Category::Other(_) => Err(CliError::InvalidArgument(format!(
                "unknown category '{}' (expected present|late|sick|unpaid|all)",
                tag
            ))),
            category => Ok(Some(category)),
        },
    }
}

// ============================================================================
// Formatters
// ============================================================================

/// Table colour for a category's display colour index
pub fn category_color(category: &Category) -> Color {
    match category.color_index() {
        1 => Color::Red,
        3 => Color::Yellow,
        10 => Color::Green,
        _ => Color::Reset,
    }
}

fn header(table: &mut Table, columns: &[&str], no_color: bool) {
    if no_color {
        table.set_header(columns.to_vec());
    } else {
        table.set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
}

fn category_cell(category: &Category, text: String, no_color: bool) -> Cell {
    if no_color {
        Cell::new(text)
    } else {
        Cell::new(text).fg(category_color(category))
    }
}

/// Overall percentages for the window (human or JSON)
pub fn format_summary(snapshot: &DashboardSnapshot, json: bool, no_color: bool) -> String {
    if json {
        let value = json!({
            "range": { "start": snapshot.range.start(), "end": snapshot.range.end() },
            "record_count": snapshot.record_count,
            "employee_count": snapshot.employee_count,
            "summary": snapshot.summary,
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(&mut table, &["Category", "Percentage"], no_color);

    for category in Category::KNOWN {
        let percentage = format!("{:.2}%", snapshot.summary.get(&category));
        table.add_row(Row::from(vec![
            category_cell(&category, category.label().to_string(), no_color),
            Cell::new(percentage),
        ]));
    }
    table.add_row(Row::from(vec![
        Cell::new("Attendance"),
        Cell::new(format!("{:.2}%", snapshot.summary.attendance)),
    ]));

    format!(
        "Window: {} ({} records, {} employees)\n{}",
        snapshot.range, snapshot.record_count, snapshot.employee_count, table
    )
}

fn ranking_table(entries: &[RankingEntry], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(
        &mut table,
        &["#", "ID", "Employee", "Department", "Percentage"],
        no_color,
    );

    for (index, entry) in entries.iter().enumerate() {
        table.add_row(Row::from(vec![
            (index + 1).to_string(),
            entry.employee_id.to_string(),
            truncate(&entry.employee_name, 30),
            truncate(&entry.department_name, 24),
            format!("{:.1}%", entry.percentage),
        ]));
    }
    table
}

/// Top-N lists for the given categories (human or JSON)
pub fn format_rankings(
    snapshot: &DashboardSnapshot,
    categories: &[Category],
    json: bool,
    no_color: bool,
) -> String {
    if json {
        let lists: serde_json::Map<String, serde_json::Value> = categories
            .iter()
            .map(|c| (c.as_str().to_string(), json!(snapshot.rankings.get(c))))
            .collect();
        return serde_json::to_string_pretty(&lists).unwrap_or_else(|_| "{}".to_string());
    }

    let mut sections = Vec::with_capacity(categories.len());
    for category in categories {
        let entries = snapshot.rankings.get(category);
        let title = format!("{} ({})", category.label(), snapshot.range);
        if entries.is_empty() {
            sections.push(format!("{}\nNo {} records.", title, category.label()));
        } else {
            sections.push(format!("{}\n{}", title, ranking_table(entries, no_color)));
        }
    }
    sections.join("\n\n")
}

/// One drill-down page (human or JSON)
pub fn format_detail(page: &DetailPage, tz: &FixedOffset, json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(page).unwrap_or_else(|_| "{}".to_string());
    }

    let mut lines = vec![format!(
        "Employee {}{}",
        page.employee_id,
        page.employee_name
            .as_deref()
            .map(|name| format!(" - {}", name))
            .unwrap_or_default()
    )];
    let percentages = &page.stats.percentages;
    lines.push(format!(
        "Present {:.1}% | Late {:.1}% | Sick {:.1}% | Unpaid {:.1}% ({} records)",
        percentages.present,
        percentages.late,
        percentages.sick,
        percentages.unpaid,
        page.stats.total
    ));

    if page.records.is_empty() {
        lines.push("No records match the current filters.".to_string());
        return lines.join("\n");
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(
        &mut table,
        &["ID", "Check In", "Check Out", "Category", "Worked"],
        no_color,
    );

    for record in &page.records {
        table.add_row(Row::from(vec![
            Cell::new(record.id),
            Cell::new(record.check_in_display(tz)),
            Cell::new(record.check_out_display(tz).unwrap_or_else(|| "-".to_string())),
            category_cell(&record.category, record.category.label().to_string(), no_color),
            Cell::new(display_label(record, tz)),
        ]));
    }

    lines.push(table.to_string());
    lines.push(format!(
        "Page {} of {} ({} records, {} per page)",
        page.page_index, page.total_pages, page.total_items, page.page_size
    ));
    lines.join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        // Char-based so multi-byte names never split
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
