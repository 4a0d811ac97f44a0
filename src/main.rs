//! CLI entry point for the ward balancer tool.
//!
//! Provides subcommands for summarizing block population by ward and
//! neighborhood council, scoring candidate ward scenarios against the
//! current assignment, and inspecting the discovered session configuration.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use ward_balancer::analyzers::aggregate::aggregate;
use ward_balancer::analyzers::balance::compute_balance;
use ward_balancer::analyzers::report::{build_report, metrics_table, scenario_table};
use ward_balancer::analyzers::scenario::compare;
use ward_balancer::output::{Workbook, export, print_json};
use ward_balancer::prepare;
use ward_balancer::session::AnalysisSession;
use ward_balancer::table::BlockTable;

#[derive(Parser)]
#[command(name = "ward_balancer")]
#[command(about = "Analyze block population balance across ward boundaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Current ward assignment column in the block table
    #[arg(long, global = true, default_value = "Ward_Numbe")]
    ward_column: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize population by ward and neighborhood council and export the
    /// report workbook
    Summarize {
        /// Path to the block table CSV
        #[arg(value_name = "BLOCKS_CSV")]
        input: String,

        /// Workbook directory to export sheets into (default: summary<yy>)
        #[arg(short, long)]
        output: Option<String>,

        /// Neighborhood council name column
        #[arg(long, default_value = "Name")]
        nc_column: String,

        /// Warn if the prepared total population falls below this floor
        #[arg(long)]
        min_population: Option<f64>,

        /// Also log the report bundle as pretty-printed JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Score candidate ward-assignment columns against the current one
    Scenario {
        /// Path to the block table CSV
        #[arg(value_name = "BLOCKS_CSV")]
        input: String,

        /// Scenario assignment columns to score, one sheet each
        #[arg(short, long, required = true, num_args = 1..)]
        columns: Vec<String>,

        /// Workbook directory to export sheets into (default: summary<yy>)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the discovered session configuration and table schema
    Inspect {
        /// Path to the block table CSV
        #[arg(value_name = "BLOCKS_CSV")]
        input: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ward_balancer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ward_balancer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            input,
            output,
            nc_column,
            min_population,
            json,
        } => summarize(
            &input,
            output.as_deref(),
            &cli.ward_column,
            &nc_column,
            min_population,
            json,
        ),
        Commands::Scenario {
            input,
            columns,
            output,
        } => scenario(&input, &columns, output.as_deref(), &cli.ward_column),
        Commands::Inspect { input } => inspect(&input),
    }
}

/// Loads the block table and prepares it for one analysis session.
#[tracing::instrument(skip(ward_column))]
fn load_session(input: &str, ward_column: &str) -> Result<(BlockTable, AnalysisSession)> {
    let mut table = BlockTable::from_csv_path(input)?;
    let session = AnalysisSession::discover(&table)?;
    prepare::prepare(&mut table, &session, ward_column)?;
    Ok((table, session))
}

fn workbook_for(output: Option<&str>, session: &AnalysisSession) -> Result<Workbook> {
    let dir = match output {
        Some(dir) => dir.to_string(),
        None => format!("summary{}", session.year),
    };
    Workbook::create(dir)
}

fn summarize(
    input: &str,
    output: Option<&str>,
    ward_column: &str,
    nc_column: &str,
    min_population: Option<f64>,
    json: bool,
) -> Result<()> {
    let (table, session) = load_session(input, ward_column)?;

    if let Some(floor) = min_population {
        if !prepare::verify_total(&table, &session, floor)? {
            warn!("Review recent edits before trusting this summary");
        }
    }

    let value_columns = [
        session.new_units_field.as_str(),
        session.total_pop_field.as_str(),
    ];
    let by_ward = aggregate(&table, &session.ward_alias, &value_columns)?;
    let by_nc = aggregate(&table, nc_column, &value_columns)?;
    let target = compute_balance(&by_ward, &session.total_pop_field)?;

    let bundle = build_report(&by_ward, &by_nc, &target, &session, nc_column);
    if json {
        print_json(&bundle)?;
    }

    let workbook = workbook_for(output, &session)?;
    export(&bundle.by_nc, "by_NC", &workbook)?;
    export(&bundle.by_ward, "by_ward", &workbook)?;
    export(&bundle.metrics, "metrics", &workbook)?;

    info!(
        workbook = %workbook.dir().display(),
        total_population = target.total_population,
        average = target.average,
        band_min = target.band.min,
        band_max = target.band.max,
        "Summary exported"
    );
    Ok(())
}

fn scenario(
    input: &str,
    columns: &[String],
    output: Option<&str>,
    ward_column: &str,
) -> Result<()> {
    let (table, session) = load_session(input, ward_column)?;

    let by_ward = aggregate(
        &table,
        &session.ward_alias,
        &[session.total_pop_field.as_str()],
    )?;
    let target = compute_balance(&by_ward, &session.total_pop_field)?;

    let workbook = workbook_for(output, &session)?;
    export(&metrics_table(&target, &session), "metrics", &workbook)?;

    for column in columns {
        let report = compare(
            &table,
            &session.ward_alias,
            column,
            &session.total_pop_field,
            &target,
        )?;

        let out_of_band = report
            .rows
            .iter()
            .filter(|row| row.candidate < target.band.min || row.candidate > target.band.max)
            .count();
        info!(
            scenario = %column,
            wards = report.rows.len(),
            out_of_band,
            "Scenario scored"
        );

        export(&scenario_table(&report), column, &workbook)?;
    }

    info!(workbook = %workbook.dir().display(), "Scenario sheets exported");
    Ok(())
}

fn inspect(input: &str) -> Result<()> {
    let table = BlockTable::from_csv_path(input)?;
    let session = AnalysisSession::discover(&table)?;

    info!(
        rows = table.len(),
        columns = table.columns().len(),
        "Block table loaded"
    );
    for column in table.columns() {
        info!(column = %column, "Schema column");
    }
    print_json(&session)?;
    Ok(())
}
