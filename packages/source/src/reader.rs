//! CSV file reader producing typed incident records.
//!
//! Resolves a [`DatasetDefinition`]'s field mapping against the file's
//! header row, then parses every data row into an
//! [`IncidentRecord`]. A missing column or an untypeable value is a
//! [`SourceError::Schema`] and aborts the read; an empty file is a valid
//! empty relation.

use std::io::Read;
use std::path::Path;

use robos_peru_incident_models::IncidentRecord;

use crate::SourceError;
use crate::dataset::{DatasetDefinition, FieldMapping};

/// Options for one read pass.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Maximum number of data rows to read (testing affordance).
    pub limit: Option<u64>,
}

/// Resolved header positions for the canonical columns.
#[derive(Debug, Clone, Copy)]
struct ColumnIndexes {
    district_code: usize,
    district_name: usize,
    modality: usize,
    year: usize,
    month: usize,
    count: usize,
}

/// Finds the index of the first candidate header present in the file.
fn resolve_column(
    headers: &[String],
    candidates: &[String],
    logical: &str,
) -> Result<usize, SourceError> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|h| h == candidate))
        .ok_or_else(|| SourceError::Schema {
            message: format!(
                "missing column '{logical}' (tried: {})",
                candidates.join(", ")
            ),
        })
}

fn resolve_columns(
    headers: &[String],
    fields: &FieldMapping,
) -> Result<ColumnIndexes, SourceError> {
    Ok(ColumnIndexes {
        district_code: resolve_column(headers, &fields.district_code, "district_code")?,
        district_name: resolve_column(headers, &fields.district_name, "district_name")?,
        modality: resolve_column(headers, &fields.modality, "modality")?,
        year: resolve_column(headers, &fields.year, "year")?,
        month: resolve_column(headers, &fields.month, "month")?,
        count: resolve_column(headers, &fields.count, "count")?,
    })
}

/// Parses one cell into its expected type, reporting the row and column
/// on failure.
fn parse_cell<T: std::str::FromStr>(
    raw: &str,
    logical: &str,
    row_number: u64,
) -> Result<T, SourceError> {
    raw.trim().parse().map_err(|_| SourceError::Schema {
        message: format!("row {row_number}: value '{raw}' in column '{logical}' is not valid"),
    })
}

/// Reads incident records from a CSV file on disk.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be opened, or any
/// error [`read_incidents_from`] produces.
pub fn read_incidents(
    path: &Path,
    def: &DatasetDefinition,
    options: &ReadOptions,
) -> Result<Vec<IncidentRecord>, SourceError> {
    log::info!("Reading dataset '{}' from {}", def.id, path.display());
    let file = std::fs::File::open(path)?;
    read_incidents_from(file, def, options)
}

/// Reads incident records from any CSV byte stream.
///
/// The header row is mandatory. Zero data rows is not an error: the
/// pipeline propagates an empty relation into empty outputs.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] on malformed CSV, or
/// [`SourceError::Schema`] when a required column is missing or a value
/// cannot be interpreted as its expected type.
pub fn read_incidents_from<R: Read>(
    input: R,
    def: &DatasetDefinition,
    options: &ReadOptions,
) -> Result<Vec<IncidentRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(def.delimiter_byte())
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.is_empty() {
        return Err(SourceError::Schema {
            message: "CSV file contains no header row".to_owned(),
        });
    }

    let columns = resolve_columns(&headers, &def.fields)?;

    let mut records: Vec<IncidentRecord> = Vec::new();

    for result in reader.records() {
        let row = result?;
        // Header row is line 1; the first data row is 2.
        let row_number = records.len() as u64 + 2;

        let cell = |idx: usize| row.get(idx).unwrap_or("").trim().to_owned();

        records.push(IncidentRecord {
            district_code: cell(columns.district_code),
            district_name: cell(columns.district_name),
            modality: cell(columns.modality),
            year: parse_cell(&cell(columns.year), "year", row_number)?,
            month: parse_cell(&cell(columns.month), "month", row_number)?,
            count: parse_cell(&cell(columns.count), "count", row_number)?,
        });

        if let Some(max) = options.limit
            && records.len() as u64 >= max
        {
            log::info!("Reached limit of {max} rows, stopping read");
            break;
        }
    }

    if records.is_empty() {
        log::warn!("Dataset '{}' contains no data rows", def.id);
    } else {
        log::info!("Parsed {} incident records", records.len());
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::default_dataset;

    fn read(csv_text: &str) -> Result<Vec<IncidentRecord>, SourceError> {
        read_incidents_from(
            csv_text.as_bytes(),
            &default_dataset(),
            &ReadOptions::default(),
        )
    }

    #[test]
    fn reads_upstream_headers() {
        let records = read(
            "UBIGEO_HECHO,DIST_HECHO,P_MODALIDADES,ANIO,MES,cantidad\n\
             150101,LIMA,ARREBATO,2023,1,10\n\
             150132,SAN MARTIN DE PORRES,COGOTEO,2023,2,4\n",
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].district_code, "150101");
        assert_eq!(records[0].district_name, "LIMA");
        assert_eq!(records[0].modality, "ARREBATO");
        assert_eq!(records[0].year, 2023);
        assert_eq!(records[0].month, 1);
        assert!((records[0].count - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reads_fallback_headers() {
        let records = read(
            "district_code,district_name,modality,year,month,count\n\
             040101,AREQUIPA,ESCALAMIENTO,2024,3,2\n",
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].district_name, "AREQUIPA");
    }

    #[test]
    fn preserves_fractional_counts() {
        let records = read(
            "UBIGEO_HECHO,DIST_HECHO,P_MODALIDADES,ANIO,MES,cantidad\n\
             150101,LIMA,ARREBATO,2023,1,2.75\n",
        )
        .unwrap();
        assert!((records[0].count - 2.75).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let result = read(
            "UBIGEO_HECHO,DIST_HECHO,ANIO,MES,cantidad\n\
             150101,LIMA,2023,1,10\n",
        );
        match result {
            Err(SourceError::Schema { message }) => {
                assert!(message.contains("modality"), "unexpected message: {message}");
                assert!(message.contains("P_MODALIDADES"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_count_is_a_schema_error() {
        let result = read(
            "UBIGEO_HECHO,DIST_HECHO,P_MODALIDADES,ANIO,MES,cantidad\n\
             150101,LIMA,ARREBATO,2023,1,muchos\n",
        );
        match result {
            Err(SourceError::Schema { message }) => {
                assert!(message.contains("row 2"), "unexpected message: {message}");
                assert!(message.contains("count"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_yields_empty_relation() {
        let records = read("UBIGEO_HECHO,DIST_HECHO,P_MODALIDADES,ANIO,MES,cantidad\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn limit_caps_rows_read() {
        let records = read_incidents_from(
            "UBIGEO_HECHO,DIST_HECHO,P_MODALIDADES,ANIO,MES,cantidad\n\
             150101,LIMA,ARREBATO,2023,1,10\n\
             150101,LIMA,ARREBATO,2023,2,11\n\
             150101,LIMA,ARREBATO,2023,3,12\n"
                .as_bytes(),
            &default_dataset(),
            &ReadOptions { limit: Some(2) },
        )
        .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn short_row_fails_typing_not_panics() {
        // flexible mode lets the row through; the missing numeric cell
        // then fails schema typing with a row reference.
        let result = read(
            "UBIGEO_HECHO,DIST_HECHO,P_MODALIDADES,ANIO,MES,cantidad\n\
             150101,LIMA,ARREBATO,2023\n",
        );
        assert!(matches!(result, Err(SourceError::Schema { .. })));
    }
}
