//! Attendance punch records as delivered by the record source

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Employee identifier as issued by the directory
pub type EmployeeId = u64;

/// Display format for punch timestamps in the viewer's time zone
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Attendance classification of a single punch record
///
/// Missing or empty tags mean `Present`. Anything other than the four known
/// tags is kept verbatim in `Other`: it counts toward totals but never lands
/// in a named bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Category {
    #[default]
    Present,
    Late,
    Sick,
    Unpaid,
    Other(String),
}

impl Category {
    /// The four named buckets, in dashboard order
    pub const KNOWN: [Category; 4] = [
        Category::Present,
        Category::Late,
        Category::Sick,
        Category::Unpaid,
    ];

    /// Parse a raw tag; empty means present
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "present" => Category::Present,
            "late" => Category::Late,
            "sick" => Category::Sick,
            "unpaid" => Category::Unpaid,
            other => Category::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Present => "present",
            Category::Late => "late",
            Category::Sick => "sick",
            Category::Unpaid => "unpaid",
            Category::Other(tag) => tag,
        }
    }

    /// Human label used in listings
    pub fn label(&self) -> &str {
        match self {
            Category::Present => "Present",
            Category::Late => "Late Arrival",
            Category::Sick => "Sick Leave",
            Category::Unpaid => "Unpaid Leave",
            Category::Other(tag) => tag,
        }
    }

    /// Sick and unpaid days are leave, not worked time
    pub fn is_leave(&self) -> bool {
        matches!(self, Category::Sick | Category::Unpaid)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }

    /// Calendar colour index: 1 red (leave), 3 yellow (late), 10 green (present)
    pub fn color_index(&self) -> u8 {
        match self {
            Category::Sick | Category::Unpaid => 1,
            Category::Late => 3,
            Category::Present => 10,
            Category::Other(_) => 0,
        }
    }
}

impl From<Option<String>> for Category {
    fn from(raw: Option<String>) -> Self {
        raw.as_deref().map(Category::parse).unwrap_or_default()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One check-in/check-out event
///
/// Timestamps are stored in UTC; conversion to the viewer's zone happens
/// only for date filtering and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    #[serde(default)]
    pub category: Category,
    pub check_in: DateTime<Utc>,
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Calendar date of the check-in as seen in `tz`
    pub fn check_in_date(&self, tz: &FixedOffset) -> NaiveDate {
        self.check_in.with_timezone(tz).date_naive()
    }

    pub fn check_in_display(&self, tz: &FixedOffset) -> String {
        self.check_in.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
    }

    /// Check-out in `tz`, `None` while the punch is still open
    pub fn check_out_display(&self, tz: &FixedOffset) -> Option<String> {
        self.check_out
            .map(|ts| ts.with_timezone(tz).format(DISPLAY_FORMAT).to_string())
    }
}

/// Name shown for an employee id whose records disagree: the smallest one
pub fn canonical_name<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    names.into_iter().min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_category_parse_defaults_to_present() {
        assert_eq!(Category::parse(""), Category::Present);
        assert_eq!(Category::parse("  "), Category::Present);
        assert_eq!(Category::from(None), Category::Present);
        assert_eq!(Category::parse("late"), Category::Late);
        assert_eq!(
            Category::parse("remote"),
            Category::Other("remote".to_string())
        );
    }

    #[test]
    fn test_record_deserialize_missing_and_null_category() {
        let missing: AttendanceRecord = serde_json::from_str(
            r#"{"id":1,"employee_id":7,"employee_name":"Ana","check_in":"2025-03-01T07:55:00Z"}"#,
        )
        .unwrap();
        assert_eq!(missing.category, Category::Present);
        assert!(missing.check_out.is_none());

        let null: AttendanceRecord = serde_json::from_str(
            r#"{"id":2,"employee_id":7,"employee_name":"Ana","category":null,"check_in":"2025-03-01T07:55:00Z"}"#,
        )
        .unwrap();
        assert_eq!(null.category, Category::Present);

        let sick: AttendanceRecord = serde_json::from_str(
            r#"{"id":3,"employee_id":7,"employee_name":"Ana","category":"sick","check_in":"2025-03-01T07:55:00Z"}"#,
        )
        .unwrap();
        assert_eq!(sick.category, Category::Sick);
    }

    #[test]
    fn test_category_serializes_as_tag() {
        let json = serde_json::to_string(&Category::Unpaid).unwrap();
        assert_eq!(json, "\"unpaid\"");
        let json = serde_json::to_string(&Category::Other("wfh".into())).unwrap();
        assert_eq!(json, "\"wfh\"");
    }

    #[test]
    fn test_display_in_viewer_zone() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let record = AttendanceRecord {
            id: 1,
            employee_id: 1,
            employee_name: "Budi".into(),
            category: Category::Present,
            check_in: Utc.with_ymd_and_hms(2025, 1, 31, 20, 30, 5).unwrap(),
            check_out: None,
        };

        assert_eq!(record.check_in_display(&tz), "2025-02-01 03:30:05");
        assert_eq!(
            record.check_in_date(&tz),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()
        );
        assert_eq!(record.check_out_display(&tz), None);
    }

    #[test]
    fn test_color_index() {
        assert_eq!(Category::Sick.color_index(), 1);
        assert_eq!(Category::Unpaid.color_index(), 1);
        assert_eq!(Category::Late.color_index(), 3);
        assert_eq!(Category::Present.color_index(), 10);
    }
}
