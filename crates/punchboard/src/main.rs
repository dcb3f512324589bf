//! punchboard - attendance analytics from the command line

mod cli;

use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use punchboard_core::{
    export_rankings_to_csv, export_records_to_csv, export_snapshot_to_json, Category,
    CategoryFilter, DashboardParams, DashboardSnapshot, DashboardStore, Dataset, DatasetParser,
    EmployeeId, LoadReport, PunchboardConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{exit_code, CliError, PeriodArgs};

type Store = DashboardStore<Arc<Dataset>, Arc<Dataset>>;

#[derive(Parser)]
#[command(
    name = "punchboard",
    version,
    about = "Attendance analytics: summaries, rankings and employee drill-down",
    long_about = "Reads attendance punch records from a JSON dataset and reports category\n\
                  percentages, per-category employee rankings and single-employee history.\n\
                  \n\
                  Examples:\n\
                    punchboard summary                         # Current month\n\
                    punchboard summary -p quarter --quarter 2  # Q2 of this year\n\
                    punchboard rank --category late -p year    # Top 10 late arrivals this year\n\
                    punchboard employee 42 --category sick     # Sick days of employee 42\n\
                    punchboard export ./reports -p month --month 3\n\
                  \n\
                  Environment Variables:\n\
                    PUNCHBOARD_DATA                  # Dataset file\n\
                    PUNCHBOARD_CONFIG                # Config file\n\
                    PUNCHBOARD_NO_COLOR              # Disable ANSI colors\n\
                    PUNCHBOARD_LOG                   # Log filter (default: warn)"
)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalOpts {
    /// Dataset file (default: <data_dir>/punchboard/punches.json)
    #[arg(long, env = "PUNCHBOARD_DATA", global = true)]
    data: Option<PathBuf>,

    /// Config file (default: <config_dir>/punchboard/config.toml)
    #[arg(long, env = "PUNCHBOARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "PUNCHBOARD_NO_COLOR", global = true)]
    no_color: bool,

    /// Re-derive present/late from check-in time before analysing
    #[arg(long, global = true)]
    classify: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Overall category percentages for a period
    Summary {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Top-N employees per category for a period
    Rank {
        #[command(flatten)]
        period: PeriodArgs,
        /// present|late|sick|unpaid|all
        #[arg(long, short = 'c', default_value = "all")]
        category: String,
        /// List length (default: config top_n)
        #[arg(long, short = 'n')]
        top: Option<usize>,
    },
    /// One employee's records with independent filters and paging
    Employee {
        employee_id: EmployeeId,
        #[command(flatten)]
        period: PeriodArgs,
        /// present|late|sick|unpaid|all
        #[arg(long, short = 'c', default_value = "all")]
        category: String,
        /// 1-based page
        #[arg(long, default_value = "1")]
        page: usize,
        /// Rows per page (default: config page_size)
        #[arg(long)]
        page_size: Option<usize>,
        /// Also write the filtered records to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Write rankings CSV and snapshot JSON for a period
    Export {
        /// Output directory
        dir: PathBuf,
        #[command(flatten)]
        period: PeriodArgs,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(&cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let opts = &cli.opts;

    match &cli.command {
        Command::Summary { period } => run_summary(opts, period).await?,
        Command::Rank {
            period,
            category,
            top,
        } => run_rank(opts, period, category, *top).await?,
        Command::Employee {
            employee_id,
            period,
            category,
            page,
            page_size,
            csv,
        } => {
            run_employee(
                opts,
                *employee_id,
                period,
                category,
                *page,
                *page_size,
                csv.as_deref(),
            )
            .await?
        }
        Command::Export { dir, period } => run_export(opts, dir, period).await?,
    }

    Ok(())
}

/// Logs go to stderr so table/JSON output on stdout stays clean
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("PUNCHBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(opts: &GlobalOpts, top: Option<usize>) -> Result<PunchboardConfig> {
    let mut config = match &opts.config {
        Some(path) => PunchboardConfig::load(path)?,
        None => PunchboardConfig::load_default()?,
    };
    if let Some(top) = top {
        config.top_n = top;
    }
    config.validate()?;
    Ok(config)
}

fn data_path(opts: &GlobalOpts) -> Result<PathBuf> {
    opts.data
        .clone()
        .or_else(|| dirs::data_dir().map(|d| d.join("punchboard").join("punches.json")))
        .context("Could not determine dataset path (use --data or PUNCHBOARD_DATA)")
}

async fn open_store(opts: &GlobalOpts, config: PunchboardConfig) -> Result<Store> {
    let path = data_path(opts)?;
    let tz = config.timezone();

    let mut report = LoadReport::new();
    let mut dataset = DatasetParser::new()
        .with_policy(config.arrival, tz)
        .parse(&path, &mut report)
        .await
        .with_context(|| format!("Failed to load dataset {}", path.display()))?;

    if opts.classify {
        let changed = dataset.reclassify(&config.arrival, &tz);
        info!(changed, "Reclassified records by arrival time");
    }

    print_load_report(&report, opts.json);

    let dataset = Arc::new(dataset);
    Ok(DashboardStore::new(Arc::clone(&dataset), dataset, config))
}

fn print_load_report(report: &LoadReport, json: bool) {
    for entry in &report.errors {
        debug!(source = %entry.source, severity = ?entry.severity, "{}", entry.message);
    }
    if json || !report.has_errors() {
        return;
    }

    let skipped = report.errors.len() - report.warnings().count();
    eprintln!(
        "Loaded {} records ({} skipped, {} unknown categories, {} inverted punches)",
        report.records_loaded, skipped, report.unrecognized_categories, report.inverted_punches
    );
}

fn today(tz: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

async fn load_snapshot(store: &Store, params: &DashboardParams) -> Result<Arc<DashboardSnapshot>> {
    let outcome = store.load(params).await.map_err(CliError::from)?;
    outcome
        .applied()
        .context("Dashboard load was superseded by a newer one")
}

async fn run_summary(opts: &GlobalOpts, period: &PeriodArgs) -> Result<()> {
    let store = open_store(opts, load_config(opts, None)?).await?;
    let params = period.params(today(store.timezone()))?;
    let snapshot = load_snapshot(&store, &params).await?;

    println!(
        "{}",
        cli::format_summary(&snapshot, opts.json, opts.no_color)
    );
    Ok(())
}

async fn run_rank(
    opts: &GlobalOpts,
    period: &PeriodArgs,
    category: &str,
    top: Option<usize>,
) -> Result<()> {
    let categories = match cli::parse_category(category)? {
        Some(category) => vec![category],
        None => Category::KNOWN.to_vec(),
    };

    let store = open_store(opts, load_config(opts, top)?).await?;
    let params = period.params(today(store.timezone()))?;
    let snapshot = load_snapshot(&store, &params).await?;

    println!(
        "{}",
        cli::format_rankings(&snapshot, &categories, opts.json, opts.no_color)
    );
    Ok(())
}

async fn run_employee(
    opts: &GlobalOpts,
    employee_id: EmployeeId,
    period: &PeriodArgs,
    category: &str,
    page: usize,
    page_size: Option<usize>,
    csv: Option<&Path>,
) -> Result<()> {
    let category = match cli::parse_category(category)? {
        Some(category) => CategoryFilter::Only(category),
        None => CategoryFilter::All,
    };

    let store = open_store(opts, load_config(opts, None)?).await?;
    let tz = *store.timezone();
    let window = period.window(today(&tz))?;

    let opened = store
        .select_employee(employee_id)
        .await
        .map_err(CliError::from)?
        .applied()
        .context("Drill-down load was superseded")?;
    if opened.total_items == 0 {
        let scanned = store.with_drill_down(|state| state.full_records().len());
        return Err(CliError::UnknownEmployee {
            employee_id,
            scanned: scanned.unwrap_or_default(),
        }
        .into());
    }

    store.set_detail_window(window)?;
    store.set_detail_category(category)?;
    if let Some(page_size) = page_size {
        store.set_page_size(page_size)?;
    }
    store.goto_page(page)?;

    let detail = store
        .detail_page()
        .ok_or(CliError::Core(punchboard_core::CoreError::NoEmployeeSelected))?;
    println!(
        "{}",
        cli::format_detail(&detail, &tz, opts.json, opts.no_color)
    );

    if let Some(path) = csv {
        let records = store
            .with_drill_down(|state| state.filtered_records().to_vec())
            .unwrap_or_default();
        export_records_to_csv(&records, &tz, path)?;
        if !opts.json {
            eprintln!("Wrote {} records to {}", records.len(), path.display());
        }
    }

    Ok(())
}

async fn run_export(opts: &GlobalOpts, dir: &Path, period: &PeriodArgs) -> Result<()> {
    let store = open_store(opts, load_config(opts, None)?).await?;
    let params = period.params(today(store.timezone()))?;
    let snapshot = load_snapshot(&store, &params).await?;

    let stem = format!("{}_{}", snapshot.range.start(), snapshot.range.end());
    let csv_path = dir.join(format!("rankings_{}.csv", stem));
    let json_path = dir.join(format!("snapshot_{}.json", stem));

    export_rankings_to_csv(&snapshot, &csv_path)?;
    export_snapshot_to_json(&snapshot, &json_path)?;

    if opts.json {
        let written = serde_json::json!({ "rankings": csv_path, "snapshot": json_path });
        println!("{}", serde_json::to_string_pretty(&written)?);
    } else {
        println!("Wrote {}", csv_path.display());
        println!("Wrote {}", json_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_employee_command() {
        let cli = Cli::try_parse_from([
            "punchboard",
            "--data",
            "punches.json",
            "employee",
            "42",
            "--category",
            "sick",
            "--page",
            "2",
            "--json",
        ])
        .unwrap();

        assert!(cli.opts.json);
        assert_eq!(cli.opts.data, Some(PathBuf::from("punches.json")));
        let Command::Employee {
            employee_id,
            category,
            page,
            period,
            ..
        } = cli.command
        else {
            panic!("Expected employee command");
        };
        assert_eq!(employee_id, 42);
        assert_eq!(category, "sick");
        assert_eq!(page, 2);
        assert!(period.period.is_none());
    }

    #[test]
    fn test_parse_period_anchors() {
        let cli = Cli::try_parse_from([
            "punchboard",
            "summary",
            "-p",
            "quarter",
            "--year",
            "2024",
            "--quarter",
            "4",
        ])
        .unwrap();

        let Command::Summary { period } = cli.command else {
            panic!("Expected summary command");
        };
        let range = period
            .params(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert_eq!(range.end(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_to_requires_from() {
        let result = Cli::try_parse_from(["punchboard", "summary", "--to", "2025-01-31"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_open_store_reports_missing_dataset() {
        let dir = tempfile::TempDir::new().unwrap();
        let opts = GlobalOpts {
            data: Some(dir.path().join("missing.json")),
            config: Some(dir.path().join("config.toml")),
            json: true,
            no_color: true,
            classify: false,
        };

        let config = load_config(&opts, None).unwrap();
        let err = open_store(&opts, config).await.err().unwrap();
        assert!(err.to_string().contains("Failed to load dataset"));
    }

    #[tokio::test]
    async fn test_export_writes_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let data = dir.path().join("punches.json");
        std::fs::write(
            &data,
            r#"{
                "departments": { "1": "Finance" },
                "records": [
                    { "id": 1, "employee_id": 1, "employee_name": "Ana",
                      "category": "present", "check_in": "2025-03-03T00:55:00Z" }
                ]
            }"#,
        )
        .unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "utc_offset_minutes = 0\n").unwrap();

        let opts = GlobalOpts {
            data: Some(data),
            config: Some(config),
            json: true,
            no_color: true,
            classify: false,
        };
        let cli = Cli::try_parse_from([
            "punchboard", "export", "out", "-p", "month", "--year", "2025", "--month", "3",
        ])
        .unwrap();
        let Command::Export { period, .. } = cli.command else {
            panic!("Expected export command");
        };

        let out = dir.path().join("out");
        run_export(&opts, &out, &period).await.unwrap();

        let csv = std::fs::read_to_string(out.join("rankings_2025-03-01_2025-03-31.csv")).unwrap();
        assert!(csv.contains("present,1,1,Ana,Finance,100.0"));
        assert!(out.join("snapshot_2025-03-01_2025-03-31.json").exists());
    }
}
