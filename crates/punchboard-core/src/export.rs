//! Export of dashboard rankings, snapshots and drill-down records
//!
//! Provides simple, testable export with proper error handling.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::analytics::DashboardSnapshot;
use crate::classify::worked_hours;
use crate::models::AttendanceRecord;

/// Export every ranked list of a snapshot to CSV
///
/// CSV columns: Category, Rank, Employee ID, Employee, Department, Percentage
/// Lists follow dashboard order (present, late, sick, unpaid); rank is 1-based.
///
/// # Errors
/// Returns error if file creation or write operations fail
///
/// # Examples
///
/// ```no_run
/// use punchboard_core::analytics::DashboardSnapshot;
/// use punchboard_core::export::export_rankings_to_csv;
/// use punchboard_core::range::DateRange;
/// use chrono::NaiveDate;
/// use std::path::Path;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let snapshot = DashboardSnapshot::empty(DateRange::single(day));
/// export_rankings_to_csv(&snapshot, Path::new("rankings.csv")).unwrap();
/// ```
pub fn export_rankings_to_csv(snapshot: &DashboardSnapshot, path: &Path) -> Result<()> {
    let mut writer = create_writer(path)?;

    writeln!(
        writer,
        "Category,Rank,Employee ID,Employee,Department,Percentage"
    )
    .context("Failed to write CSV header")?;

    for (category, entries) in snapshot.rankings.iter() {
        for (index, entry) in entries.iter().enumerate() {
            writeln!(
                writer,
                "{},{},{},{},{},{:.1}",
                category.as_str(),
                index + 1,
                entry.employee_id,
                quote(&entry.employee_name),
                quote(&entry.department_name),
                entry.percentage
            )
            .with_context(|| {
                format!("Failed to write {} row for {}", category, entry.employee_id)
            })?;
        }
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

/// Export attendance records to CSV with timestamps in the viewer's zone
///
/// CSV columns: ID, Employee ID, Employee, Category, Check In, Check Out, Worked Hours
/// Rows keep input order; an open punch leaves Check Out empty.
pub fn export_records_to_csv(
    records: &[AttendanceRecord],
    tz: &FixedOffset,
    path: &Path,
) -> Result<()> {
    let mut writer = create_writer(path)?;

    writeln!(
        writer,
        "ID,Employee ID,Employee,Category,Check In,Check Out,Worked Hours"
    )
    .context("Failed to write CSV header")?;

    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{},{},{:.2}",
            record.id,
            record.employee_id,
            quote(&record.employee_name),
            quote(record.category.as_str()),
            record.check_in_display(tz),
            record.check_out_display(tz).unwrap_or_default(),
            worked_hours(record)
        )
        .with_context(|| format!("Failed to write row for record {}", record.id))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;

    Ok(())
}

/// Export a snapshot (summary, rankings, window) as pretty JSON
pub fn export_snapshot_to_json(snapshot: &DashboardSnapshot, path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let json =
        serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot to JSON")?;

    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))?;

    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    ensure_parent(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Quote a CSV field when it contains a separator, quote or newline
fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
