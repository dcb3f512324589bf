//! Performance benchmarks for the dashboard pipeline
//!
//! aggregate / rank / summarize over synthetic record sets, plus the
//! drill-down refilter that runs on every filter change.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;

use punchboard_core::analytics::{aggregate, rank, summarize, DashboardSnapshot, DEFAULT_TOP_N};
use punchboard_core::drilldown::{filter, CategoryFilter, DateWindow};
use punchboard_core::models::{AttendanceRecord, Category};
use punchboard_core::range::DateRange;

/// `count` records spread over `employees` people and one quarter
fn generate_records(count: usize, employees: u64) -> Vec<AttendanceRecord> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 50, 0).unwrap();
    (0..count)
        .map(|i| {
            let employee_id = i as u64 % employees;
            let category = match i % 11 {
                0 => Category::Sick,
                1 => Category::Unpaid,
                2..=4 => Category::Late,
                _ => Category::Present,
            };
            let check_in = start + Duration::days((i / employees as usize) as i64 % 90);
            AttendanceRecord {
                id: i as u64,
                employee_id,
                employee_name: format!("Employee {}", employee_id),
                category,
                check_in,
                check_out: Some(check_in + Duration::hours(9)),
            }
        })
        .collect()
}

fn departments(employees: u64) -> HashMap<u64, String> {
    (0..employees)
        .filter(|id| id % 4 != 0)
        .map(|id| (id, format!("Dept {}", id % 7)))
        .collect()
}

fn aggregate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for count in [1_000, 10_000, 100_000] {
        let records = generate_records(count, 200);
        let departments = departments(200);
        group.bench_with_input(BenchmarkId::new("records", count), &records, |b, records| {
            b.iter(|| black_box(aggregate(records, &departments)));
        });
    }

    group.finish();
}

fn rank_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");

    for employees in [50, 500, 5_000] {
        let records = generate_records(employees as usize * 20, employees);
        let aggregation = aggregate(&records, &departments(employees));
        group.bench_with_input(
            BenchmarkId::new("employees", employees),
            &aggregation,
            |b, aggregation| {
                b.iter(|| {
                    for category in Category::KNOWN {
                        black_box(rank(&aggregation.per_employee, &category, DEFAULT_TOP_N));
                    }
                });
            },
        );
    }

    group.finish();
}

fn summary_benchmark(c: &mut Criterion) {
    let records = generate_records(10_000, 200);
    let aggregation = aggregate(&records, &HashMap::new());

    c.bench_function("summarize", |b| {
        b.iter(|| black_box(summarize(&aggregation.totals, aggregation.grand_total)));
    });
}

fn snapshot_benchmark(c: &mut Criterion) {
    let records = generate_records(10_000, 200);
    let departments = departments(200);
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
    );

    c.bench_function("snapshot_10k", |b| {
        b.iter(|| {
            black_box(DashboardSnapshot::compute(
                &records,
                &departments,
                range,
                DEFAULT_TOP_N,
            ))
        });
    });
}

fn drilldown_benchmark(c: &mut Criterion) {
    // One employee with a few years of history
    let records = generate_records(1_000, 1);
    let tz = chrono::FixedOffset::east_opt(7 * 3600).unwrap();
    let window = DateWindow::Range(DateRange::new(
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
    ));
    let late = CategoryFilter::Only(Category::Late);

    c.bench_function("drilldown_filter", |b| {
        b.iter(|| black_box(filter(&records, &window, &late, &tz)));
    });
}

criterion_group!(
    benches,
    aggregate_benchmark,
    rank_benchmark,
    summary_benchmark,
    snapshot_benchmark,
    drilldown_benchmark
);
criterion_main!(benches);
