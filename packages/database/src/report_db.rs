//! Report database: five full-replace relation writers plus run metadata.
//!
//! Table names (`riesgo`, `modalidades`, `zonas`, `temporal`,
//! `historial`) are the contract with the downstream reporting layer.
//! Each writer drops and recreates its table and bulk-inserts the rows in
//! the order the aggregation produced, all inside one transaction, so an
//! overwrite either lands completely or leaves the previous run's table
//! untouched. The writers are independent; a failure in one never blocks
//! the other four.

use std::path::Path;

use duckdb::Connection;
use robos_peru_aggregate_models::{
    HistoryPoint, ModalityTotal, MonthlyTotal, RiskAssessment, ZoneTotal,
};

use crate::DbError;

/// Number of rows per INSERT chunk (`DuckDB` handles large batches well).
const CHUNK_SIZE: usize = 5_000;

/// The five output tables in write order.
pub const OUTPUT_TABLES: &[&str] = &["riesgo", "modalidades", "zonas", "temporal", "historial"];

/// Opens (or creates) the report database.
///
/// # Errors
///
/// Returns [`DbError`] if directory creation or the connection fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;

    conn.execute_batch(
        "SET threads = 4;
         SET memory_limit = '512MB';",
    )?;

    Ok(conn)
}

/// Runs `insert` between a fresh `DROP`/`CREATE` of `table`, inside one
/// transaction. On any error the transaction rolls back and the table's
/// previous contents remain in place.
fn replace_table<F>(
    conn: &Connection,
    table: &str,
    create_sql: &str,
    insert: F,
) -> Result<u64, DbError>
where
    F: FnOnce(&Connection) -> Result<u64, DbError>,
{
    conn.execute_batch("BEGIN TRANSACTION")?;

    let result = (|| {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
        conn.execute_batch(create_sql)?;
        insert(conn)
    })();

    match result {
        Ok(rows) => {
            conn.execute_batch("COMMIT")?;
            log::info!("Replaced table {table}: {rows} rows");
            Ok(rows)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                log::warn!("Rollback after failed {table} write also failed: {rollback}");
            }
            Err(e)
        }
    }
}

/// Builds a multi-row `INSERT` statement with one `placeholder_row`
/// group per row in the chunk.
fn multi_row_insert_sql(table: &str, columns: &str, placeholder_row: &str, rows: usize) -> String {
    let mut sql = format!("INSERT INTO {table} ({columns}) VALUES ");
    for i in 0..rows {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(placeholder_row);
    }
    sql
}

/// Replaces the `riesgo` table with the classified district totals.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn write_riesgo(conn: &Connection, rows: &[RiskAssessment]) -> Result<u64, DbError> {
    replace_table(
        conn,
        "riesgo",
        "CREATE TABLE riesgo (
            district_code VARCHAR NOT NULL,
            district_name VARCHAR NOT NULL,
            total DOUBLE NOT NULL,
            risk_level VARCHAR NOT NULL
        )",
        |conn| {
            let mut written = 0u64;
            for chunk in rows.chunks(CHUNK_SIZE) {
                let sql = multi_row_insert_sql(
                    "riesgo",
                    "district_code, district_name, total, risk_level",
                    "(?, ?, ?, ?)",
                    chunk.len(),
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut param_idx = 1usize;
                for row in chunk {
                    let level: &str = row.risk_level.as_ref();
                    stmt.raw_bind_parameter(param_idx, &row.district_code)?;
                    stmt.raw_bind_parameter(param_idx + 1, &row.district_name)?;
                    stmt.raw_bind_parameter(param_idx + 2, row.total)?;
                    stmt.raw_bind_parameter(param_idx + 3, level)?;
                    param_idx += 4;
                }
                written += u64::try_from(stmt.raw_execute()?).unwrap_or(0);
            }
            Ok(written)
        },
    )
}

/// Replaces the `modalidades` table with the ranked modality totals.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn write_modalidades(conn: &Connection, rows: &[ModalityTotal]) -> Result<u64, DbError> {
    replace_table(
        conn,
        "modalidades",
        "CREATE TABLE modalidades (
            district_code VARCHAR NOT NULL,
            modality VARCHAR NOT NULL,
            total DOUBLE NOT NULL
        )",
        |conn| {
            let mut written = 0u64;
            for chunk in rows.chunks(CHUNK_SIZE) {
                let sql = multi_row_insert_sql(
                    "modalidades",
                    "district_code, modality, total",
                    "(?, ?, ?)",
                    chunk.len(),
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut param_idx = 1usize;
                for row in chunk {
                    stmt.raw_bind_parameter(param_idx, &row.district_code)?;
                    stmt.raw_bind_parameter(param_idx + 1, &row.modality)?;
                    stmt.raw_bind_parameter(param_idx + 2, row.total)?;
                    param_idx += 3;
                }
                written += u64::try_from(stmt.raw_execute()?).unwrap_or(0);
            }
            Ok(written)
        },
    )
}

/// Replaces the `zonas` table with the ranked district totals.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn write_zonas(conn: &Connection, rows: &[ZoneTotal]) -> Result<u64, DbError> {
    replace_table(
        conn,
        "zonas",
        "CREATE TABLE zonas (
            district_code VARCHAR NOT NULL,
            district_name VARCHAR NOT NULL,
            total DOUBLE NOT NULL
        )",
        |conn| {
            let mut written = 0u64;
            for chunk in rows.chunks(CHUNK_SIZE) {
                let sql = multi_row_insert_sql(
                    "zonas",
                    "district_code, district_name, total",
                    "(?, ?, ?)",
                    chunk.len(),
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut param_idx = 1usize;
                for row in chunk {
                    stmt.raw_bind_parameter(param_idx, &row.district_code)?;
                    stmt.raw_bind_parameter(param_idx + 1, &row.district_name)?;
                    stmt.raw_bind_parameter(param_idx + 2, row.total)?;
                    param_idx += 3;
                }
                written += u64::try_from(stmt.raw_execute()?).unwrap_or(0);
            }
            Ok(written)
        },
    )
}

/// Replaces the `temporal` table with the monthly seasonality totals.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn write_temporal(conn: &Connection, rows: &[MonthlyTotal]) -> Result<u64, DbError> {
    replace_table(
        conn,
        "temporal",
        "CREATE TABLE temporal (
            month INTEGER NOT NULL,
            total DOUBLE NOT NULL
        )",
        |conn| {
            let mut written = 0u64;
            for chunk in rows.chunks(CHUNK_SIZE) {
                let sql =
                    multi_row_insert_sql("temporal", "month, total", "(?, ?)", chunk.len());
                let mut stmt = conn.prepare(&sql)?;
                let mut param_idx = 1usize;
                for row in chunk {
                    stmt.raw_bind_parameter(param_idx, i64::from(row.month))?;
                    stmt.raw_bind_parameter(param_idx + 1, row.total)?;
                    param_idx += 2;
                }
                written += u64::try_from(stmt.raw_execute()?).unwrap_or(0);
            }
            Ok(written)
        },
    )
}

/// Replaces the `historial` table with the per-district time series.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn write_historial(conn: &Connection, rows: &[HistoryPoint]) -> Result<u64, DbError> {
    replace_table(
        conn,
        "historial",
        "CREATE TABLE historial (
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            district_code VARCHAR NOT NULL,
            total DOUBLE NOT NULL
        )",
        |conn| {
            let mut written = 0u64;
            for chunk in rows.chunks(CHUNK_SIZE) {
                let sql = multi_row_insert_sql(
                    "historial",
                    "year, month, district_code, total",
                    "(?, ?, ?, ?)",
                    chunk.len(),
                );
                let mut stmt = conn.prepare(&sql)?;
                let mut param_idx = 1usize;
                for row in chunk {
                    stmt.raw_bind_parameter(param_idx, row.year)?;
                    stmt.raw_bind_parameter(param_idx + 1, i64::from(row.month))?;
                    stmt.raw_bind_parameter(param_idx + 2, &row.district_code)?;
                    stmt.raw_bind_parameter(param_idx + 3, row.total)?;
                    param_idx += 4;
                }
                written += u64::try_from(stmt.raw_execute()?).unwrap_or(0);
            }
            Ok(written)
        },
    )
}

/// Records run metadata (`generated_at`, `source_rows`) in the `_meta`
/// key/value table.
///
/// # Errors
///
/// Returns [`DbError`] if the upsert fails.
pub fn write_meta(conn: &Connection, source_rows: u64) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _meta (
            key VARCHAR PRIMARY KEY,
            value VARCHAR NOT NULL
        )",
    )?;

    let generated_at = chrono::Utc::now().to_rfc3339();
    set_meta(conn, "generated_at", &generated_at)?;
    set_meta(conn, "source_rows", &source_rows.to_string())?;

    Ok(())
}

/// Sets a metadata value in the `_meta` table.
///
/// # Errors
///
/// Returns [`DbError`] if the upsert fails.
pub fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<(), DbError> {
    let mut stmt = conn.prepare(
        "INSERT INTO _meta (key, value) VALUES (?, ?)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
    )?;
    stmt.execute([key, value])?;
    Ok(())
}

/// Gets a metadata value from the `_meta` table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>, DbError> {
    let mut stmt = conn.prepare("SELECT value FROM _meta WHERE key = ?")?;
    let result = stmt.query_row([key], |row| row.get(0));
    match result {
        Ok(v) => Ok(Some(v)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::DuckDb(e)),
    }
}

/// Returns the row count of a named table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails (e.g. the table does not
/// exist yet).
pub fn table_row_count(conn: &Connection, table: &str) -> Result<u64, DbError> {
    let mut stmt = conn.prepare(&format!("SELECT COUNT(*) FROM {table}"))?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    #[allow(clippy::cast_sign_loss)]
    Ok(count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use robos_peru_incident_models::RiskLevel;

    fn memory_conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn riesgo_rows() -> Vec<RiskAssessment> {
        vec![
            RiskAssessment {
                district_code: "040101".to_string(),
                district_name: "AREQUIPA".to_string(),
                total: 10.0,
                risk_level: RiskLevel::Low,
            },
            RiskAssessment {
                district_code: "150101".to_string(),
                district_name: "LIMA".to_string(),
                total: 100.0,
                risk_level: RiskLevel::High,
            },
        ]
    }

    #[test]
    fn writes_and_counts_riesgo() {
        let conn = memory_conn();
        let written = write_riesgo(&conn, &riesgo_rows()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(table_row_count(&conn, "riesgo").unwrap(), 2);
    }

    #[test]
    fn full_replace_discards_prior_contents() {
        let conn = memory_conn();
        write_riesgo(&conn, &riesgo_rows()).unwrap();

        let second = vec![RiskAssessment {
            district_code: "150132".to_string(),
            district_name: "SAN MARTIN DE PORRES".to_string(),
            total: 50.0,
            risk_level: RiskLevel::High,
        }];
        write_riesgo(&conn, &second).unwrap();

        assert_eq!(table_row_count(&conn, "riesgo").unwrap(), 1);
        let code: String = conn
            .prepare("SELECT district_code FROM riesgo")
            .unwrap()
            .query_row([], |row| row.get(0))
            .unwrap();
        assert_eq!(code, "150132");
    }

    #[test]
    fn rewriting_identical_rows_is_idempotent() {
        let conn = memory_conn();
        let rows = riesgo_rows();
        write_riesgo(&conn, &rows).unwrap();
        write_riesgo(&conn, &rows).unwrap();

        let mut stmt = conn
            .prepare("SELECT district_code, total, risk_level FROM riesgo ORDER BY district_code")
            .unwrap();
        let got: Vec<(String, f64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            got,
            vec![
                ("040101".to_string(), 10.0, "Low".to_string()),
                ("150101".to_string(), 100.0, "High".to_string()),
            ]
        );
    }

    #[test]
    fn empty_relation_writes_empty_table() {
        let conn = memory_conn();
        let written = write_modalidades(&conn, &[]).unwrap();
        assert_eq!(written, 0);
        assert_eq!(table_row_count(&conn, "modalidades").unwrap(), 0);
    }

    #[test]
    fn writes_all_relation_shapes() {
        let conn = memory_conn();

        write_modalidades(
            &conn,
            &[ModalityTotal {
                district_code: "150101".to_string(),
                modality: "ARREBATO".to_string(),
                total: 15.0,
            }],
        )
        .unwrap();

        write_zonas(
            &conn,
            &[ZoneTotal {
                district_code: "150101".to_string(),
                district_name: "LIMA".to_string(),
                total: 18.0,
            }],
        )
        .unwrap();

        write_temporal(
            &conn,
            &[
                MonthlyTotal {
                    month: 1,
                    total: 34.0,
                },
                MonthlyTotal {
                    month: 2,
                    total: 7.5,
                },
            ],
        )
        .unwrap();

        write_historial(
            &conn,
            &[HistoryPoint {
                year: 2023,
                month: 1,
                district_code: "150101".to_string(),
                total: 13.0,
            }],
        )
        .unwrap();

        for (table, expected) in [
            ("modalidades", 1),
            ("zonas", 1),
            ("temporal", 2),
            ("historial", 1),
        ] {
            assert_eq!(table_row_count(&conn, table).unwrap(), expected, "{table}");
        }
    }

    #[test]
    fn fractional_totals_round_trip() {
        let conn = memory_conn();
        write_temporal(
            &conn,
            &[MonthlyTotal {
                month: 3,
                total: 2.75,
            }],
        )
        .unwrap();
        let total: f64 = conn
            .prepare("SELECT total FROM temporal")
            .unwrap()
            .query_row([], |row| row.get(0))
            .unwrap();
        assert!((total - 2.75).abs() < f64::EPSILON);
    }

    #[test]
    fn meta_round_trips() {
        let conn = memory_conn();
        write_meta(&conn, 1234).unwrap();
        assert_eq!(
            get_meta(&conn, "source_rows").unwrap().as_deref(),
            Some("1234")
        );
        assert!(get_meta(&conn, "generated_at").unwrap().is_some());
        assert_eq!(get_meta(&conn, "missing").unwrap(), None);
    }
}
