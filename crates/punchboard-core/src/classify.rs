//! Arrival classification and per-record presentation helpers
//!
//! A check-in at or after the late threshold (local time) marks the record
//! late. Leave records (sick/unpaid) are never reclassified and count zero
//! worked hours.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceRecord, Category};

/// Working-day rules used to classify and backfill punches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalPolicy {
    /// First local time of day that counts as late
    #[serde(with = "hhmm")]
    pub late_after: NaiveTime,
    /// Default check-in for leave days
    #[serde(with = "hhmm")]
    pub shift_start: NaiveTime,
    /// Default check-out for leave days
    #[serde(with = "hhmm")]
    pub shift_end: NaiveTime,
}

impl Default for ArrivalPolicy {
    fn default() -> Self {
        Self {
            late_after: NaiveTime::from_hms_opt(8, 1, 0).unwrap_or(NaiveTime::MIN),
            shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            shift_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl ArrivalPolicy {
    /// Present or late, from the check-in's local time of day
    pub fn classify(&self, check_in: DateTime<Utc>, tz: &FixedOffset) -> Category {
        if check_in.with_timezone(tz).time() >= self.late_after {
            Category::Late
        } else {
            Category::Present
        }
    }

    /// Re-derive present/late from the check-in; other tags are left alone
    ///
    /// Returns true when the category changed.
    pub fn apply(&self, record: &mut AttendanceRecord, tz: &FixedOffset) -> bool {
        if !matches!(record.category, Category::Present | Category::Late) {
            return false;
        }
        let category = self.classify(record.check_in, tz);
        if category == record.category {
            return false;
        }
        record.category = category;
        true
    }

    /// Default shift for a leave day, as UTC check-in/check-out
    pub fn leave_shift(
        &self,
        date: NaiveDate,
        tz: &FixedOffset,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = tz
            .from_local_datetime(&date.and_time(self.shift_start))
            .single()?;
        let end = tz
            .from_local_datetime(&date.and_time(self.shift_end))
            .single()?;
        Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
    }
}

/// Whole seconds between check-in and check-out; 0 for leave and open punches
pub fn worked_seconds(record: &AttendanceRecord) -> i64 {
    if record.category.is_leave() {
        return 0;
    }
    match record.check_out {
        Some(out) if out > record.check_in => (out - record.check_in).num_seconds(),
        _ => 0,
    }
}

/// Hours between check-in and check-out; 0 for leave and open punches
pub fn worked_hours(record: &AttendanceRecord) -> f64 {
    worked_seconds(record) as f64 / 3600.0
}

/// Calendar label: leave type, or worked time with local punch times
///
/// ```
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use punchboard_core::classify::display_label;
/// use punchboard_core::models::{AttendanceRecord, Category};
///
/// let tz = FixedOffset::east_opt(0).unwrap();
/// let record = AttendanceRecord {
///     id: 1,
///     employee_id: 1,
///     employee_name: "Ana".into(),
///     category: Category::Present,
///     check_in: Utc.with_ymd_and_hms(2025, 1, 6, 7, 55, 0).unwrap(),
///     check_out: Some(Utc.with_ymd_and_hms(2025, 1, 6, 16, 25, 0).unwrap()),
/// };
/// assert_eq!(display_label(&record, &tz), "8h 30m(07:55 - 16:25)");
/// ```
pub fn display_label(record: &AttendanceRecord, tz: &FixedOffset) -> String {
    if record.category.is_leave() {
        return record.category.label().to_string();
    }

    // Partial minutes are dropped, never rounded up past the punch times
    let minutes = worked_seconds(record) / 60;
    let check_in = record.check_in.with_timezone(tz).format("%H:%M");
    let check_out = record
        .check_out
        .map(|ts| ts.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_default();

    format!("{}h {}m({} - {})", minutes / 60, minutes % 60, check_in, check_out)
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
