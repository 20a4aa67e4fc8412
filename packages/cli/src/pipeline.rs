//! Full pipeline: read the CSV export, derive the five relations,
//! persist them into the report database.
//!
//! A schema error aborts before anything is computed. The five relation
//! writes are attempted independently: one failure is logged and
//! collected while the remaining tables still get their overwrite, so a
//! run can be partially successful.

use std::path::{Path, PathBuf};
use std::time::Instant;

use robos_peru_database::{DbError, report_db};
use robos_peru_source::dataset::{self, DatasetDefinition};
use robos_peru_source::reader::{ReadOptions, read_incidents};
use serde::Serialize;

/// Arguments for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Path to the CSV export.
    pub input: PathBuf,
    /// Path to the DuckDB report database.
    pub db: PathBuf,
    /// Optional dataset definition TOML overriding the embedded default.
    pub dataset: Option<PathBuf>,
    /// Optional cap on source rows (testing affordance).
    pub limit: Option<u64>,
}

/// Per-table write result recorded in the run metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableWrite {
    /// Output table name.
    pub table: String,
    /// Rows written.
    pub rows: u64,
}

/// Summary of one pipeline run, persisted as `metadata.json` next to
/// the report database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Dataset definition id used for the read.
    pub dataset_id: String,
    /// Source rows parsed from the CSV.
    pub rows_read: u64,
    /// Tables that wrote successfully.
    pub written: Vec<TableWrite>,
    /// Tables whose write failed this run.
    pub failed: Vec<String>,
    /// Wall-clock duration of the run.
    pub elapsed_seconds: f64,
}

/// Loads the dataset definition: the `--dataset` override if given,
/// otherwise the embedded default.
fn load_definition(path: Option<&Path>) -> Result<DatasetDefinition, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            log::info!("Using dataset definition from {}", path.display());
            Ok(dataset::load_dataset(path)?)
        }
        None => Ok(dataset::default_dataset()),
    }
}

/// Runs the full pipeline.
///
/// # Errors
///
/// Returns an error if the read or aggregation setup fails, or, after
/// all five tables have been attempted, if any relation failed to
/// persist. A partial failure still leaves the successful tables
/// replaced.
pub fn run(args: &RunArgs) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let definition = load_definition(args.dataset.as_deref())?;

    // Schema errors propagate here, before any output is computed.
    let records = read_incidents(
        &args.input,
        &definition,
        &ReadOptions { limit: args.limit },
    )?;

    if records.is_empty() {
        log::warn!("Empty source relation; all five output tables will be empty");
    }

    let relations = robos_peru_aggregate::derive_all(&records);

    // Connection scope covers exactly one run; dropped on every exit path.
    let conn = report_db::open(&args.db)?;

    let mut written: Vec<TableWrite> = Vec::new();
    let mut failed: Vec<String> = Vec::new();

    let writes: [(&str, Result<u64, DbError>); 5] = [
        ("riesgo", report_db::write_riesgo(&conn, &relations.riesgo)),
        (
            "modalidades",
            report_db::write_modalidades(&conn, &relations.modalidades),
        ),
        ("zonas", report_db::write_zonas(&conn, &relations.zonas)),
        (
            "temporal",
            report_db::write_temporal(&conn, &relations.temporal),
        ),
        (
            "historial",
            report_db::write_historial(&conn, &relations.historial),
        ),
    ];

    for (table, result) in writes {
        match result {
            Ok(rows) => written.push(TableWrite {
                table: table.to_owned(),
                rows,
            }),
            Err(e) => {
                log::error!("Failed to write {table}: {e}");
                failed.push(table.to_owned());
            }
        }
    }

    if let Err(e) = report_db::write_meta(&conn, records.len() as u64) {
        log::error!("Failed to write run metadata: {e}");
    }

    let elapsed = start.elapsed();
    let summary = RunSummary {
        dataset_id: definition.id.clone(),
        rows_read: records.len() as u64,
        written,
        failed: failed.clone(),
        elapsed_seconds: elapsed.as_secs_f64(),
    };

    write_summary_json(&args.db, &summary);

    log::info!(
        "Run complete: {} rows in, {}/5 tables written, took {:.1}s",
        summary.rows_read,
        summary.written.len(),
        elapsed.as_secs_f64()
    );

    if failed.is_empty() {
        Ok(summary)
    } else {
        Err(format!(
            "{} of 5 relations failed to persist: {}",
            failed.len(),
            failed.join(", ")
        )
        .into())
    }
}

/// Writes `metadata.json` next to the report database. Failures here are
/// logged but never fail the run; the database is the contract, the
/// summary file is a convenience.
fn write_summary_json(db_path: &Path, summary: &RunSummary) {
    let path = db_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("metadata.json");

    match serde_json::to_string_pretty(summary) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                log::warn!("Failed to write {}: {e}", path.display());
            } else {
                log::info!("Wrote run metadata to {}", path.display());
            }
        }
        Err(e) => log::warn!("Failed to serialize run metadata: {e}"),
    }
}

/// Parses and schema-validates the CSV without touching any sink.
///
/// # Errors
///
/// Returns an error on I/O, CSV, or schema problems, the same failures
/// `run` would abort on.
pub fn check(
    input: &Path,
    dataset_path: Option<&Path>,
    limit: Option<u64>,
) -> Result<u64, Box<dyn std::error::Error>> {
    let definition = load_definition(dataset_path)?;
    let records = read_incidents(input, &definition, &ReadOptions { limit })?;
    Ok(records.len() as u64)
}
