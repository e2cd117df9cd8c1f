use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use connmetrics::config::Config;
use connmetrics::metrics::{post_connection_metrics, report_to_rows, validate_report};
use connmetrics::models::HourlyConnectionMetricsReport;
use connmetrics::storage;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "connmetrics-admin")]
#[command(about = "Connection metrics admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured connections table if it does not exist
    Init,
    /// Check a JSON report file and print the rows it would produce
    Validate {
        /// Path to the report file
        file: PathBuf,
    },
    /// Validate a JSON report file and insert its rows
    Ingest {
        /// Path to the report file
        file: PathBuf,
    },
}

fn read_report(path: &Path) -> Result<HourlyConnectionMetricsReport> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let payload: Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let report = validate_report(&payload)
        .with_context(|| format!("{} is not a valid connection metrics report", path.display()))?;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    connmetrics::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let config = Config::from_env()?;
            storage::open_connections_table(&config.database).await?;
            println!("✓ Table '{}' is ready", config.database.table);
        }
        Commands::Validate { file } => {
            let report = read_report(&file)?;
            let rows = report_to_rows(&report);
            println!(
                "✓ Valid report from server '{}' ({} rows)",
                report.server_id,
                rows.len()
            );
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Ingest { file } => {
            let report = read_report(&file)?;
            let config = Config::from_env()?;
            let table = storage::open_connections_table(&config.database).await?;
            let inserted = post_connection_metrics(table.as_ref(), &report).await?;
            println!(
                "✓ Inserted {} rows from server '{}' into '{}'",
                inserted, report.server_id, config.database.table
            );
        }
    }

    Ok(())
}
