use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cartlytics_core::config::Config;
use cartlytics_core::stage::STAGING_TABLE;
use cartlytics_duckdb::queries::{features, marts};
use cartlytics_duckdb::{loader, pipeline, Warehouse};

#[derive(Parser)]
#[command(name = "cartlytics")]
#[command(about = "E-commerce session warehouse builder")]
#[command(version = "0.1.0")]
struct Cli {
    /// Warehouse database file (overrides CARTLYTICS_WAREHOUSE_PATH)
    #[arg(long)]
    warehouse: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize the raw CSV export into the staging table
    Load {
        /// Raw CSV path (overrides CARTLYTICS_RAW_CSV)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run the ordered SQL transformation pipeline
    Pipeline {
        /// Directory holding the transformation scripts
        #[arg(long)]
        sql_dir: Option<PathBuf>,
    },
    /// Full rebuild: load staging, then run the pipeline
    Build {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        sql_dir: Option<PathBuf>,
    },
    /// Export the mart views to CSV files
    ExportMarts {
        /// Output directory (overrides CARTLYTICS_ARTIFACTS_DIR)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Export the model-feature table to a CSV file
    ExportFeatures {
        /// Output file (defaults to <artifacts_dir>/features.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Human-readable logging; level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cartlytics_duckdb=info".parse()?),
        )
        .init();

    let cfg = Config::from_env();
    let cli = Cli::parse();

    let warehouse_path = cli
        .warehouse
        .unwrap_or_else(|| PathBuf::from(&cfg.warehouse_path));
    let warehouse = Warehouse::open(&warehouse_path)?;

    match cli.command {
        Commands::Load { input } => {
            let input = input.unwrap_or_else(|| PathBuf::from(&cfg.raw_csv_path));
            let rows = loader::load_staging(&warehouse, &input)?;
            println!(
                "Loaded {rows} rows into {STAGING_TABLE} in {}.",
                warehouse_path.display()
            );
        }
        Commands::Pipeline { sql_dir } => {
            let sql_dir = sql_dir.unwrap_or_else(|| PathBuf::from(&cfg.sql_dir));
            pipeline::run_pipeline(&warehouse, &sql_dir)?;
            println!("SQL pipeline completed.");
        }
        Commands::Build { input, sql_dir } => {
            let input = input.unwrap_or_else(|| PathBuf::from(&cfg.raw_csv_path));
            let sql_dir = sql_dir.unwrap_or_else(|| PathBuf::from(&cfg.sql_dir));
            let rows = loader::load_staging(&warehouse, &input)?;
            println!(
                "Loaded {rows} rows into {STAGING_TABLE} in {}.",
                warehouse_path.display()
            );
            pipeline::run_pipeline(&warehouse, &sql_dir)?;
            println!("SQL pipeline completed.");
        }
        Commands::ExportMarts { out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| PathBuf::from(&cfg.artifacts_dir));
            let written = marts::export_marts(&warehouse, &out_dir)?;
            for path in &written {
                println!("Exported {}.", path.display());
            }
        }
        Commands::ExportFeatures { output } => {
            let output = output
                .unwrap_or_else(|| PathBuf::from(&cfg.artifacts_dir).join("features.csv"));
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let rows = features::export_features(&warehouse, &output)?;
            println!("Exported {rows} feature rows to {}.", output.display());
        }
    }

    Ok(())
}
