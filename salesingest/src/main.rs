use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use salesdw::Warehouse;
use salesdw::config::WarehouseConfig;
use salesdw::models::StatisticsSnapshot;
use salesingest::{IngestConfig, Pipeline, RunReport};

#[derive(Parser, Debug)]
#[command(
    name = "salesingest",
    about = "Load cleaned sales CSV files into the star-schema warehouse and inspect its statistics."
)]
struct Cli {
    /// SQLite database file (defaults to $SALESDW_DATABASE_PATH or ./warehouse.sqlite).
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    database: Option<PathBuf>,

    /// Minimum log level to display.
    #[arg(long, default_value_t = LogLevelArg::Info, value_enum)]
    log_level: LogLevelArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every CSV file in the data directory, validation file last.
    Load {
        /// Directory holding the CSV files (defaults to $SALESDW_DATA_DIR or ./data).
        #[arg(long, value_hint = clap::ValueHint::DirPath)]
        data_dir: Option<PathBuf>,

        /// Emit the run report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print statistics recomputed from the fact table, table counts and the batch log.
    Stats {
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => LevelFilter::Error,
            LogLevelArg::Warn => LevelFilter::Warn,
            LogLevelArg::Info => LevelFilter::Info,
            LogLevelArg::Debug => LevelFilter::Debug,
            LogLevelArg::Trace => LevelFilter::Trace,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default());
    logger.filter_level(LevelFilter::from(cli.log_level));
    let _ = logger.try_init();

    let mut config = WarehouseConfig::from_env().context("invalid warehouse configuration")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    let warehouse = Warehouse::open(config.clone()).with_context(|| {
        format!(
            "failed to open warehouse at '{}'",
            config.database_path.display()
        )
    })?;

    match cli.command {
        Commands::Load { data_dir, json } => {
            let mut pipeline = Pipeline::new(warehouse, IngestConfig::from_env());
            let report = pipeline
                .run(data_dir.as_deref())
                .context("load run failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_run_report(&report);
            }
            Ok(())
        }
        Commands::Stats { json } => handle_stats(&warehouse, json),
    }
}

fn format_snapshot(snapshot: &StatisticsSnapshot) -> String {
    let show = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    format!(
        "min: {} - max: {} - avg: {} - rows: {}",
        show(snapshot.min),
        show(snapshot.max),
        show(snapshot.average),
        snapshot.record_count
    )
}

fn print_run_report(report: &RunReport) {
    for file in report.files.iter().chain(report.validation.iter()) {
        println!("{}", "-".repeat(60));
        println!(
            "{} ({} rows read, {} dropped)",
            file.path.display(),
            file.rows_read,
            file.rows_dropped
        );
        println!("  file:   {}", format_snapshot(&file.file_statistics));
        println!("  global: {}", format_snapshot(&file.global_statistics));
    }
    println!("{}", "#".repeat(60));
    println!(
        "Stats from DB before validation: {}",
        format_snapshot(&report.reconciled_before_validation)
    );
    println!("Stats from DB: {}", format_snapshot(&report.reconciled_final));
}

fn handle_stats(warehouse: &Warehouse, json: bool) -> Result<()> {
    let statistics = warehouse
        .reconcile_statistics()
        .context("failed to aggregate facts")?;
    let counts = warehouse.table_counts()?;
    let batches = warehouse.list_batches()?;

    if json {
        let payload = serde_json::json!({
            "statistics": statistics,
            "counts": counts,
            "batches": batches,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Stats from DB: {}", format_snapshot(&statistics));
    println!(
        "dim_user: {}  dim_time: {}  facts_sales: {}",
        counts.users, counts.time_buckets, counts.sales
    );
    println!("{}", "-".repeat(60));
    println!("{:<6} {:<10} {:<8} {}", "BATCH", "STATUS", "ROWS", "SOURCE");
    for batch in batches {
        println!(
            "{:<6} {:<10} {:<8} {}",
            batch.batch_id,
            batch.status.as_str(),
            batch.rows,
            batch.source
        );
    }
    Ok(())
}
