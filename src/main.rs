//! gasmon - pipeline entry point

use clap::Parser;
use gasmon::config::PipelineConfig;
use gasmon::pipeline;
use tracing::info;

const REPORT_PATH: &str = "artifacts/model_comparison.json";

#[derive(Parser)]
#[command(name = "gasmon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Gas-monitoring activity classification and model comparison")]
struct Cli {
    /// SQLite database path (default: data/gas_monitoring.db)
    #[arg(long)]
    db_path: Option<String>,

    /// Table name (default: gas_monitoring)
    #[arg(long)]
    table: Option<String>,
}

fn main() -> gasmon::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gasmon=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = PipelineConfig::default();
    if let Some(db_path) = cli.db_path {
        config = config.with_db_path(db_path);
    }
    if let Some(table) = cli.table {
        config = config.with_table_name(table);
    }

    let report = pipeline::run(&config)?;
    report.save(REPORT_PATH)?;
    info!(path = REPORT_PATH, "comparison report written");

    Ok(())
}
