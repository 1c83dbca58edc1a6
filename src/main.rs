//! CLI entry point for the truck-delay data preparation tool.
//!
//! Provides subcommands for preparing the merged feature table and for
//! inspecting the cleaned input tables before a run.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use truck_delay_prep::{
    config::PrepareConfig,
    loader::load_tables,
    output::{print_json, print_pretty, write_records},
    prepare::prepare,
};

#[derive(Parser)]
#[command(name = "truck_delay_prep")]
#[command(about = "Prepare truck schedule, weather and traffic data for delay prediction", long_about = None)]
struct Cli {
    /// JSON config file; CLI flags override its values
    #[arg(short, long, global = true, env = "PREP_CONFIG")]
    config: Option<String>,

    /// Directory containing the cleaned input CSVs
    #[arg(short = 'd', long, global = true, env = "CLEANED_DATA_PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge schedules, weather and traffic into one row per truck and route
    Prepare {
        /// CSV file to write the prepared table to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gzip compress the output file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Load and validate the input tables, then log their shapes
    Describe,
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/truck_delay_prep.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"))
        .to_path_buf();
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("truck_delay_prep.log"))
        .to_os_string();

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

fn resolve_config(cli: &Cli) -> Result<PrepareConfig> {
    let mut config = match &cli.config {
        Some(path) => PrepareConfig::load(path)?,
        None => PrepareConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing();

    let cli = Cli::parse();
    let mut config = resolve_config(&cli)?;

    match cli.command {
        Commands::Prepare { output, gzip } => {
            if let Some(output) = output {
                config.output_path = output;
            }
            config.gzip_output |= gzip;
            print_pretty(&config);

            let (tables, report) = load_tables(&config)?;
            let coerced = report.total_coerced_dates();
            if coerced > 0 {
                warn!(coerced, "Timestamps coerced to null across all tables");
            }
            let coerced = report.total_coerced_numbers();
            if coerced > 0 {
                warn!(coerced, "Numeric values coerced to null across all tables");
            }

            let prepared = prepare(&tables, &config);
            print_json(&prepared.stats)?;

            let written = write_records(&config.output_path, &prepared.records, config.gzip_output)?;
            info!(path = %written.display(), "Data preparation stage completed");
        }
        Commands::Describe => {
            let (tables, report) = load_tables(&config)?;
            print_json(&report)?;
            info!(
                trips = tables.truck_schedule.len(),
                city_weather = tables.city_weather.len(),
                routes_weather = tables.routes_weather.len(),
                traffic = tables.traffic.len(),
                trucks = tables.trucks.len(),
                drivers = tables.drivers.len(),
                routes = tables.routes.len(),
                "Input tables valid"
            );
        }
    }

    Ok(())
}
