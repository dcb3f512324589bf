//! Record sources and department directories
//!
//! The store only talks to the two traits below. [`Dataset`] is the bundled
//! implementation backed by a JSON file:
//!
//! ```json
//! {
//!   "departments": { "1": "Finance" },
//!   "records": [
//!     { "id": 1, "employee_id": 1, "employee_name": "Ana",
//!       "category": "late", "check_in": "2025-03-03T01:05:00Z",
//!       "check_out": "2025-03-03T10:00:00Z" },
//!     { "id": 2, "employee_id": 1, "employee_name": "Ana",
//!       "category": "sick", "date": "2025-03-04" }
//!   ]
//! }
//! ```
//!
//! Leave records may carry a local `date` instead of punch timestamps; they
//! get the default shift from the [`ArrivalPolicy`]. Leave with neither is
//! booked on the current local day.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::classify::ArrivalPolicy;
use crate::error::{CoreError, LoadError, LoadReport};
use crate::models::{AttendanceRecord, Category, EmployeeId};
use crate::range::DateRange;

/// Query passed to a [`RecordSource`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Inclusive calendar-date window on the check-in (viewer zone)
    pub check_in_range: Option<DateRange>,
    pub employee_id: Option<EmployeeId>,
}

impl RecordFilter {
    /// Dashboard query: every employee within one window
    pub fn in_range(range: DateRange) -> Self {
        Self {
            check_in_range: Some(range),
            employee_id: None,
        }
    }

    /// Drill-down query: one employee, no date bound
    pub fn employee(employee_id: EmployeeId) -> Self {
        Self {
            check_in_range: None,
            employee_id: Some(employee_id),
        }
    }

    pub fn matches(&self, record: &AttendanceRecord, tz: &FixedOffset) -> bool {
        if let Some(id) = self.employee_id {
            if record.employee_id != id {
                return false;
            }
        }
        match &self.check_in_range {
            Some(range) => range.contains(record.check_in_date(tz)),
            None => true,
        }
    }
}

/// Anything that can answer "records matching this filter"
pub trait RecordSource: Send + Sync {
    fn fetch_records(
        &self,
        filter: &RecordFilter,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, CoreError>> + Send;
}

/// Employee id → department name lookup
pub trait DepartmentDirectory: Send + Sync {
    /// Ids without a department are simply absent from the result
    fn fetch_departments(
        &self,
        employee_ids: &BTreeSet<EmployeeId>,
    ) -> impl Future<Output = Result<HashMap<EmployeeId, String>, CoreError>> + Send;
}

impl<T: RecordSource> RecordSource for Arc<T> {
    fn fetch_records(
        &self,
        filter: &RecordFilter,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, CoreError>> + Send {
        (**self).fetch_records(filter)
    }
}

impl<T: DepartmentDirectory> DepartmentDirectory for Arc<T> {
    fn fetch_departments(
        &self,
        employee_ids: &BTreeSet<EmployeeId>,
    ) -> impl Future<Output = Result<HashMap<EmployeeId, String>, CoreError>> + Send {
        (**self).fetch_departments(employee_ids)
    }
}

/// In-memory records plus department table
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<AttendanceRecord>,
    departments: HashMap<EmployeeId, String>,
    tz: Option<FixedOffset>,
}

impl Dataset {
    pub fn new(records: Vec<AttendanceRecord>, departments: HashMap<EmployeeId, String>) -> Self {
        Self {
            records,
            departments,
            tz: None,
        }
    }

    /// Zone used to match check-in dates against range filters (default UTC)
    pub fn with_timezone(mut self, tz: FixedOffset) -> Self {
        self.tz = Some(tz);
        self
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn departments(&self) -> &HashMap<EmployeeId, String> {
        &self.departments
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reclassify present/late records by arrival time; returns how many changed
    pub fn reclassify(&mut self, policy: &ArrivalPolicy, tz: &FixedOffset) -> usize {
        self.records
            .iter_mut()
            .map(|record| policy.apply(record, tz))
            .filter(|changed| *changed)
            .count()
    }

    fn timezone(&self) -> FixedOffset {
        self.tz.unwrap_or_else(|| Utc.fix())
    }
}

impl RecordSource for Dataset {
    async fn fetch_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<AttendanceRecord>, CoreError> {
        let tz = self.timezone();
        let records: Vec<AttendanceRecord> = self
            .records
            .iter()
            .filter(|r| filter.matches(r, &tz))
            .cloned()
            .collect();

        debug!(?filter, matched = records.len(), "Dataset fetch");
        Ok(records)
    }
}

impl DepartmentDirectory for Dataset {
    async fn fetch_departments(
        &self,
        employee_ids: &BTreeSet<EmployeeId>,
    ) -> Result<HashMap<EmployeeId, String>, CoreError> {
        Ok(employee_ids
            .iter()
            .filter_map(|id| self.departments.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}

/// On-disk layout; records are kept raw so one bad entry doesn't sink the file
#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    departments: HashMap<EmployeeId, String>,
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: u64,
    employee_id: EmployeeId,
    employee_name: String,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    check_out: Option<DateTime<Utc>>,
    /// Local day for leave entries without punches
    #[serde(default)]
    date: Option<NaiveDate>,
}

/// Parser for dataset JSON files with retry on parse failure
pub struct DatasetParser {
    max_retries: u32,
    retry_delay: Duration,
    policy: ArrivalPolicy,
    tz: FixedOffset,
}

impl Default for DatasetParser {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            policy: ArrivalPolicy::default(),
            tz: Utc.fix(),
        }
    }
}

impl DatasetParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Shift rules and zone used to backfill leave entries given by date
    pub fn with_policy(mut self, policy: ArrivalPolicy, tz: FixedOffset) -> Self {
        self.policy = policy;
        self.tz = tz;
        self
    }

    /// Parse a dataset file, retrying while it may be mid-write
    ///
    /// Per-record problems land in `report`; only an unreadable or
    /// structurally invalid file is an error.
    pub async fn parse(&self, path: &Path, report: &mut LoadReport) -> Result<Dataset, CoreError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, "Retrying dataset parse after delay");
                sleep(self.retry_delay).await;
            }

            match self.try_parse(path).await {
                Ok(file) => {
                    let dataset = self.build(file, report);
                    info!(
                        path = %path.display(),
                        records = dataset.len(),
                        departments = dataset.departments.len(),
                        "Dataset loaded"
                    );
                    return Ok(dataset);
                }
                // Nothing to wait for
                Err(e @ CoreError::FileNotFound { .. }) => return Err(e),
                Err(e) => {
                    warn!(attempt, error = %e, "Dataset parse attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::FileNotFound {
            path: path.to_path_buf(),
        }))
    }

    async fn try_parse(&self, path: &Path) -> Result<DatasetFile, CoreError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoreError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CoreError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| CoreError::JsonParse {
            path: path.to_path_buf(),
            message: e.to_string(),
            source: e,
        })
    }

    fn build(&self, file: DatasetFile, report: &mut LoadReport) -> Dataset {
        let mut records = Vec::with_capacity(file.records.len());

        for (index, value) in file.records.into_iter().enumerate() {
            let source = format!("records[{}]", index);
            let raw: RawRecord = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    report.add_error(LoadError::error(source, e.to_string()));
                    continue;
                }
            };

            match self.materialize(raw) {
                Ok(record) => {
                    if let Category::Other(tag) = &record.category {
                        report.unrecognized_categories += 1;
                        report.add_warning(source.clone(), format!("unknown category '{}'", tag));
                    }
                    if matches!(record.check_out, Some(out) if out < record.check_in) {
                        report.inverted_punches += 1;
                        report.add_warning(source, "check-out before check-in");
                    }
                    records.push(record);
                }
                Err(message) => report.add_error(LoadError::error(source, message)),
            }
        }

        report.records_loaded += records.len();
        Dataset::new(records, file.departments).with_timezone(self.tz)
    }

    fn materialize(&self, raw: RawRecord) -> Result<AttendanceRecord, String> {
        let (check_in, check_out) = match (raw.check_in, raw.date) {
            (Some(check_in), _) => (check_in, raw.check_out),
            (None, date) if raw.category.is_leave() => {
                // Undated leave is booked on the viewer's today
                let date =
                    date.unwrap_or_else(|| Utc::now().with_timezone(&self.tz).date_naive());
                let (start, end) = self
                    .policy
                    .leave_shift(date, &self.tz)
                    .ok_or_else(|| format!("no default shift on {}", date))?;
                (start, raw.check_out.or(Some(end)))
            }
            (None, Some(_)) => {
                return Err(format!(
                    "only leave records may omit check_in (category '{}')",
                    raw.category
                ))
            }
            (None, None) => return Err("missing check_in".to_string()),
        };

        Ok(AttendanceRecord {
            id: raw.id,
            employee_id: raw.employee_id,
            employee_name: raw.employee_name,
            category: raw.category,
            check_in,
            check_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_dataset(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    fn record(id: u64, employee_id: EmployeeId, day: u32, hour: u32) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id,
            employee_name: format!("E{}", employee_id),
            category: Category::Present,
            check_in: Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap(),
            check_out: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_filter_matches_employee_and_range() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let r = record(1, 7, 10, 9);

        assert!(RecordFilter::default().matches(&r, &tz));
        assert!(RecordFilter::employee(7).matches(&r, &tz));
        assert!(!RecordFilter::employee(8).matches(&r, &tz));
        assert!(RecordFilter::in_range(DateRange::new(day(10), day(10))).matches(&r, &tz));
        assert!(!RecordFilter::in_range(DateRange::new(day(11), day(12))).matches(&r, &tz));
    }

    #[tokio::test]
    async fn test_dataset_fetch_uses_configured_zone() {
        // 20:00 UTC on May 10 is May 11 at UTC+7
        let dataset = Dataset::new(vec![record(1, 1, 10, 20)], HashMap::new())
            .with_timezone(FixedOffset::east_opt(7 * 3600).unwrap());

        let may_11 = RecordFilter::in_range(DateRange::single(day(11)));
        assert_eq!(dataset.fetch_records(&may_11).await.unwrap().len(), 1);

        let may_10 = RecordFilter::in_range(DateRange::single(day(10)));
        assert!(dataset.fetch_records(&may_10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dataset_departments_only_requested() {
        let departments = HashMap::from([(1, "Finance".to_string()), (2, "Ops".to_string())]);
        let dataset = Dataset::new(Vec::new(), departments);

        let found = dataset
            .fetch_departments(&BTreeSet::from([1, 3]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&1], "Finance");
    }

    #[tokio::test]
    async fn test_parse_valid_dataset() {
        let file = write_dataset(
            r#"{
                "departments": { "1": "Finance" },
                "records": [
                    { "id": 1, "employee_id": 1, "employee_name": "Ana",
                      "category": "late", "check_in": "2025-03-03T01:05:00Z",
                      "check_out": "2025-03-03T10:00:00Z" },
                    { "id": 2, "employee_id": 1, "employee_name": "Ana",
                      "check_in": "2025-03-04T00:55:00Z" }
                ]
            }"#,
        );

        let mut report = LoadReport::new();
        let dataset = DatasetParser::new()
            .parse(file.path(), &mut report)
            .await
            .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.departments()[&1], "Finance");
        assert_eq!(dataset.records()[0].category, Category::Late);
        // Missing tag defaults to present
        assert_eq!(dataset.records()[1].category, Category::Present);
        assert_eq!(report.records_loaded, 2);
        assert!(!report.has_errors());
    }

    #[tokio::test]
    async fn test_parse_keeps_odd_records_with_warnings() {
        let file = write_dataset(
            r#"{
                "records": [
                    { "id": 1, "employee_id": 1, "employee_name": "Ana",
                      "category": "remote", "check_in": "2025-03-03T01:00:00Z" },
                    { "id": 2, "employee_id": 1, "employee_name": "Ana",
                      "check_in": "2025-03-04T09:00:00Z",
                      "check_out": "2025-03-04T08:00:00Z" },
                    { "id": 3, "employee_id": 1 },
                    { "id": 4, "employee_id": 1, "employee_name": "Ana",
                      "category": "present", "date": "2025-03-05" }
                ]
            }"#,
        );

        let mut report = LoadReport::new();
        let dataset = DatasetParser::new()
            .parse(file.path(), &mut report)
            .await
            .unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(report.unrecognized_categories, 1);
        assert_eq!(report.inverted_punches, 1);
        assert_eq!(report.warnings().count(), 2);
        assert!(report.has_hard_errors());
        assert_eq!(report.errors.len(), 4);
    }

    #[tokio::test]
    async fn test_parse_backfills_leave_shift() {
        let file = write_dataset(
            r#"{
                "records": [
                    { "id": 9, "employee_id": 2, "employee_name": "Budi",
                      "category": "sick", "date": "2025-03-05" }
                ]
            }"#,
        );

        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let mut report = LoadReport::new();
        let dataset = DatasetParser::new()
            .with_policy(ArrivalPolicy::default(), tz)
            .parse(file.path(), &mut report)
            .await
            .unwrap();

        let sick = &dataset.records()[0];
        assert_eq!(sick.check_in_date(&tz), NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(sick.check_in.with_timezone(&tz).hour(), 8);
        assert_eq!(sick.check_out.unwrap().with_timezone(&tz).hour(), 17);
    }

    #[tokio::test]
    async fn test_parse_books_undated_leave_today() {
        let file = write_dataset(
            r#"{
                "records": [
                    { "id": 10, "employee_id": 2, "employee_name": "Budi",
                      "category": "unpaid" },
                    { "id": 11, "employee_id": 2, "employee_name": "Budi",
                      "category": "late" }
                ]
            }"#,
        );

        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let before = Utc::now().with_timezone(&tz).date_naive();
        let mut report = LoadReport::new();
        let dataset = DatasetParser::new()
            .with_policy(ArrivalPolicy::default(), tz)
            .parse(file.path(), &mut report)
            .await
            .unwrap();
        let after = Utc::now().with_timezone(&tz).date_naive();

        // Only the leave record may go without punches
        assert_eq!(dataset.len(), 1);
        assert_eq!(report.errors.len(), 1);

        let unpaid = &dataset.records()[0];
        let day = unpaid.check_in_date(&tz);
        assert!(day == before || day == after);
        assert_eq!(unpaid.check_in.with_timezone(&tz).hour(), 8);
        assert_eq!(unpaid.check_out.unwrap().with_timezone(&tz).hour(), 17);
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let mut report = LoadReport::new();
        let result = DatasetParser::new()
            .parse(Path::new("/nonexistent/punches.json"), &mut report)
            .await;

        assert!(matches!(result, Err(CoreError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_parse_invalid_json() {
        let file = write_dataset("not valid json");

        let mut report = LoadReport::new();
        let result = DatasetParser::new()
            .with_retries(1, Duration::from_millis(10))
            .parse(file.path(), &mut report)
            .await;

        assert!(matches!(result, Err(CoreError::JsonParse { .. })));
    }

    #[test]
    fn test_reclassify() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let records = vec![record(1, 1, 10, 7), record(2, 1, 11, 9)];
        let mut dataset = Dataset::new(records, HashMap::new());

        assert_eq!(dataset.reclassify(&ArrivalPolicy::default(), &tz), 1);
        assert_eq!(dataset.records()[1].category, Category::Late);
    }
}
