#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the robos-peru reporting pipeline.

mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::pipeline::RunArgs;

#[derive(Parser)]
#[command(name = "robos_peru_cli", about = "Theft report aggregation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: read the CSV export, derive the five
    /// reporting relations, replace the output tables
    Run {
        /// Path to the CSV export
        #[arg(long)]
        input: PathBuf,
        /// Path to the DuckDB report database
        #[arg(long, default_value = "data/robos.duckdb")]
        db: PathBuf,
        /// Dataset definition TOML overriding the embedded default
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Maximum number of source rows to read (for testing)
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Parse and schema-validate the CSV export without writing anything
    Check {
        /// Path to the CSV export
        #[arg(long)]
        input: PathBuf,
        /// Dataset definition TOML overriding the embedded default
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Maximum number of source rows to read (for testing)
        #[arg(long)]
        limit: Option<u64>,
    },
    /// List the output tables and their shapes
    Tables,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            db,
            dataset,
            limit,
        } => {
            let summary = pipeline::run(&RunArgs {
                input,
                db,
                dataset,
                limit,
            })?;
            for write in &summary.written {
                println!("{:<12} {} rows", write.table, write.rows);
            }
        }
        Commands::Check {
            input,
            dataset,
            limit,
        } => {
            let rows = pipeline::check(&input, dataset.as_deref(), limit)?;
            println!("OK: {rows} rows match the expected schema");
        }
        Commands::Tables => {
            println!("{:<12} {:<33} {}", "TABLE", "KEY", "ORDER");
            println!("{}", "-".repeat(70));
            println!(
                "{:<12} {:<33} {}",
                "riesgo", "district_code, district_name", "unordered (plus risk_level)"
            );
            println!(
                "{:<12} {:<33} {}",
                "modalidades", "district_code, modality", "total descending"
            );
            println!(
                "{:<12} {:<33} {}",
                "zonas", "district_code, district_name", "total descending"
            );
            println!("{:<12} {:<33} {}", "temporal", "month", "month ascending");
            println!(
                "{:<12} {:<33} {}",
                "historial", "year, month, district_code", "year, month ascending"
            );
        }
    }

    Ok(())
}
