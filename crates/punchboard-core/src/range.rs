//! Date range resolution for dashboard and drill-down windows
//!
//! Turns a granularity plus anchor values (year, month, quarter, day) into a
//! concrete inclusive `[start, end]` pair of calendar dates.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Unit of time window selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }

    /// Largest span (end minus start, in days) accepted by [`clamp`]
    pub fn max_days(&self) -> u64 {
        match self {
            Granularity::Day => 1,
            Granularity::Week => 7,
            Granularity::Month => 31,
            Granularity::Quarter => 92,
            Granularity::Year => 365,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "quarter" => Ok(Granularity::Quarter),
            "year" => Ok(Granularity::Year),
            other => Err(format!(
                "unknown granularity '{}' (expected day|week|month|quarter|year)",
                other
            )),
        }
    }
}

/// Caller-supplied values that pin a granularity to concrete dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchors {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub quarter: Option<u32>,
    pub day: Option<NaiveDate>,
}

impl Anchors {
    pub fn day(day: NaiveDate) -> Self {
        Self {
            day: Some(day),
            ..Self::default()
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            ..Self::default()
        }
    }

    pub fn quarter(year: i32, quarter: u32) -> Self {
        Self {
            year: Some(year),
            quarter: Some(quarter),
            ..Self::default()
        }
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }
}

/// Inclusive calendar date range, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if given backwards
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Days between start and end (0 for a single-day range)
    pub fn span_days(&self) -> u64 {
        (self.end - self.start).num_days().unsigned_abs()
    }

    /// Number of calendar days covered
    pub fn len_days(&self) -> u64 {
        self.span_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Resolve against the machine's local "today"
pub fn resolve(granularity: Granularity, anchors: &Anchors) -> Result<DateRange, CoreError> {
    resolve_at(granularity, anchors, Local::now().date_naive())
}

/// Resolve with an explicit "today" used when no day anchor is given
///
/// # Errors
/// `InvalidAnchor` when a required anchor is missing or out of range:
/// year for month/quarter/year, month 1-12, quarter 1-4.
pub fn resolve_at(
    granularity: Granularity,
    anchors: &Anchors,
    today: NaiveDate,
) -> Result<DateRange, CoreError> {
    let name = granularity.as_str();

    match granularity {
        Granularity::Day => Ok(DateRange::single(anchors.day.unwrap_or(today))),
        Granularity::Week => {
            let end = anchors.day.unwrap_or(today);
            let start = end
                .checked_sub_days(Days::new(6))
                .ok_or_else(|| CoreError::invalid_anchor(name, "day", "date out of range"))?;
            Ok(DateRange::new(start, end))
        }
        Granularity::Month => {
            let year = require_year(name, anchors)?;
            let month = anchors
                .month
                .ok_or_else(|| CoreError::invalid_anchor(name, "month", "missing"))?;
            if !(1..=12).contains(&month) {
                return Err(CoreError::invalid_anchor(
                    name,
                    "month",
                    format!("{} is outside 1-12", month),
                ));
            }
            month_span(name, year, month, 1)
        }
        Granularity::Quarter => {
            let year = require_year(name, anchors)?;
            let quarter = anchors
                .quarter
                .ok_or_else(|| CoreError::invalid_anchor(name, "quarter", "missing"))?;
            if !(1..=4).contains(&quarter) {
                return Err(CoreError::invalid_anchor(
                    name,
                    "quarter",
                    format!("{} is outside 1-4", quarter),
                ));
            }
            month_span(name, year, (quarter - 1) * 3 + 1, 3)
        }
        Granularity::Year => {
            let year = require_year(name, anchors)?;
            month_span(name, year, 1, 12)
        }
    }
}

/// Cap a caller-supplied range to the granularity's maximum span
///
/// The start never moves; an over-long range has its end pulled in to
/// `start + max_days`.
pub fn clamp(range: DateRange, granularity: Granularity) -> DateRange {
    let max_days = granularity.max_days();
    if range.span_days() <= max_days {
        return range;
    }

    let end = range
        .start
        .checked_add_days(Days::new(max_days))
        .unwrap_or(range.end);
    tracing::debug!(
        granularity = %granularity,
        requested = %range,
        clamped_end = %end,
        "Clamped date range"
    );
    DateRange::new(range.start, end)
}

/// Exact number of days in a month, leap years included
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

fn require_year(granularity: &'static str, anchors: &Anchors) -> Result<i32, CoreError> {
    anchors
        .year
        .ok_or_else(|| CoreError::invalid_anchor(granularity, "year", "missing"))
}

/// `months` whole months starting at the first of `first_month`
fn month_span(
    granularity: &'static str,
    year: i32,
    first_month: u32,
    months: u32,
) -> Result<DateRange, CoreError> {
    let out_of_range =
        || CoreError::invalid_anchor(granularity, "year", format!("{} is out of range", year));

    let start = NaiveDate::from_ymd_opt(year, first_month, 1).ok_or_else(out_of_range)?;
    let last_month = first_month + months - 1;
    let last_day = days_in_month(year, last_month).ok_or_else(out_of_range)?;
    let end = NaiveDate::from_ymd_opt(year, last_month, last_day).ok_or_else(out_of_range)?;

    Ok(DateRange::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_defaults_to_today() {
        let today = date(2025, 6, 15);
        let range = resolve_at(Granularity::Day, &Anchors::default(), today).unwrap();
        assert_eq!(range, DateRange::single(today));

        let explicit = resolve_at(Granularity::Day, &Anchors::day(date(2025, 1, 2)), today).unwrap();
        assert_eq!(explicit.start(), date(2025, 1, 2));
        assert_eq!(explicit.end(), date(2025, 1, 2));
    }

    #[test]
    fn test_week_is_trailing_seven_days() {
        let range = resolve_at(Granularity::Week, &Anchors::day(date(2025, 3, 3)), date(2000, 1, 1))
            .unwrap();
        assert_eq!(range.start(), date(2025, 2, 25));
        assert_eq!(range.end(), date(2025, 3, 3));
        assert_eq!(range.len_days(), 7);
    }

    #[test]
    fn test_month_leap_february() {
        let today = date(2025, 1, 1);
        let leap = resolve_at(Granularity::Month, &Anchors::month(2024, 2), today).unwrap();
        assert_eq!(leap.start(), date(2024, 2, 1));
        assert_eq!(leap.end(), date(2024, 2, 29));

        let common = resolve_at(Granularity::Month, &Anchors::month(2023, 2), today).unwrap();
        assert_eq!(common.end(), date(2023, 2, 28));
    }

    #[test]
    fn test_month_lengths() {
        assert_eq!(days_in_month(2025, 1), Some(31));
        assert_eq!(days_in_month(2025, 4), Some(30));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2025, 13), None);
    }

    #[test]
    fn test_quarter_four() {
        let range =
            resolve_at(Granularity::Quarter, &Anchors::quarter(2025, 4), date(2025, 1, 1)).unwrap();
        assert_eq!(range.start(), date(2025, 10, 1));
        assert_eq!(range.end(), date(2025, 12, 31));
    }

    #[test]
    fn test_quarter_one_spans_leap_february() {
        let range =
            resolve_at(Granularity::Quarter, &Anchors::quarter(2024, 1), date(2025, 1, 1)).unwrap();
        assert_eq!(range.start(), date(2024, 1, 1));
        assert_eq!(range.end(), date(2024, 3, 31));
    }

    #[test]
    fn test_year_range() {
        let range = resolve_at(Granularity::Year, &Anchors::year(2024), date(2025, 1, 1)).unwrap();
        assert_eq!(range.start(), date(2024, 1, 1));
        assert_eq!(range.end(), date(2024, 12, 31));
    }

    #[test]
    fn test_missing_and_invalid_anchors() {
        let today = date(2025, 1, 1);

        let err = resolve_at(Granularity::Month, &Anchors::default(), today).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAnchor { anchor: "year", .. }));

        let err = resolve_at(Granularity::Month, &Anchors::month(2025, 13), today).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAnchor { anchor: "month", .. }));

        let err = resolve_at(Granularity::Month, &Anchors::month(2025, 0), today).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAnchor { anchor: "month", .. }));

        let err = resolve_at(Granularity::Quarter, &Anchors::quarter(2025, 5), today).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAnchor { anchor: "quarter", .. }));

        let err = resolve_at(Granularity::Quarter, &Anchors::year(2025), today).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAnchor { anchor: "quarter", .. }));

        let err = resolve_at(Granularity::Year, &Anchors::default(), today).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAnchor { anchor: "year", .. }));
    }

    #[test]
    fn test_clamp_week_keeps_start() {
        let start = date(2025, 5, 1);
        let range = DateRange::new(start, date(2025, 5, 31));
        assert_eq!(range.span_days(), 30);

        let clamped = clamp(range, Granularity::Week);
        assert_eq!(clamped.start(), start);
        assert_eq!(clamped.span_days(), 7);
        assert_eq!(clamped.end(), date(2025, 5, 8));
    }

    #[test]
    fn test_clamp_leaves_short_ranges_alone() {
        let range = DateRange::new(date(2025, 5, 1), date(2025, 5, 3));
        assert_eq!(clamp(range, Granularity::Week), range);
        assert_eq!(clamp(range, Granularity::Day).end(), date(2025, 5, 2));
    }

    #[test]
    fn test_resolved_ranges_fit_their_caps() {
        let today = date(2024, 12, 31);
        let cases = [
            (Granularity::Day, Anchors::default()),
            (Granularity::Week, Anchors::default()),
            (Granularity::Month, Anchors::month(2024, 1)),
            (Granularity::Quarter, Anchors::quarter(2024, 3)),
            (Granularity::Year, Anchors::year(2024)),
        ];
        for (granularity, anchors) in cases {
            let range = resolve_at(granularity, &anchors, today).unwrap();
            assert_eq!(clamp(range, granularity), range, "{} exceeded cap", granularity);
        }
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("Quarter".parse::<Granularity>(), Ok(Granularity::Quarter));
        assert!("fortnight".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_range_new_orders_bounds() {
        let range = DateRange::new(date(2025, 2, 10), date(2025, 2, 1));
        assert_eq!(range.start(), date(2025, 2, 1));
        assert!(range.contains(date(2025, 2, 10)));
        assert!(!range.contains(date(2025, 2, 11)));
    }
}
