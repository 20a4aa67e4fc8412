//! Config-driven dataset definition.
//!
//! [`DatasetDefinition`] captures everything unique about one CSV export
//! in a serializable config struct: identity, delimiter, and the header
//! names that map onto each canonical column. The default definition for
//! the national police export is baked into the binary at compile time;
//! a different export can be described by pointing the CLI at another
//! TOML file.

use serde::Deserialize;

use crate::SourceError;

/// The default dataset definition, embedded at compile time.
const DEFAULT_DATASET_TOML: &str = include_str!("../datasets/robos_peru.toml");

/// A complete, config-driven description of one theft dataset export.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"robos_peru"`).
    pub id: String,
    /// Human-readable name of the export.
    pub name: String,
    /// Field delimiter (default: comma). A single-character string.
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Header name mappings for each canonical column.
    pub fields: FieldMapping,
}

impl DatasetDefinition {
    /// Returns the delimiter byte, defaulting to `,` when unset or empty.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
            .unwrap_or(b',')
    }
}

/// Maps source CSV header names to canonical incident columns.
///
/// Each list is tried in order against the file's header row; the first
/// matching header wins. Matching is exact after trimming.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Header names for the district code, tried in order.
    pub district_code: Vec<String>,
    /// Header names for the district display name, tried in order.
    pub district_name: Vec<String>,
    /// Header names for the theft modality, tried in order.
    pub modality: Vec<String>,
    /// Header names for the calendar year, tried in order.
    pub year: Vec<String>,
    /// Header names for the calendar month, tried in order.
    pub month: Vec<String>,
    /// Header names for the incident count, tried in order.
    pub count: Vec<String>,
}

/// Parses a dataset definition from TOML text.
///
/// # Errors
///
/// Returns [`SourceError::Toml`] if the text is not a valid definition.
pub fn parse_dataset_toml(text: &str) -> Result<DatasetDefinition, SourceError> {
    Ok(toml::from_str(text)?)
}

/// Returns the embedded default dataset definition.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (a compile-time guarantee,
/// the config ships inside the binary).
#[must_use]
pub fn default_dataset() -> DatasetDefinition {
    parse_dataset_toml(DEFAULT_DATASET_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded robos_peru.toml: {e}"))
}

/// Loads a dataset definition from a TOML file on disk.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read, or
/// [`SourceError::Toml`] if it is not a valid definition.
pub fn load_dataset(path: &std::path::Path) -> Result<DatasetDefinition, SourceError> {
    let text = std::fs::read_to_string(path)?;
    parse_dataset_toml(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_dataset_parses() {
        let def = default_dataset();
        assert_eq!(def.id, "robos_peru");
        assert!(!def.name.is_empty());
    }

    #[test]
    fn embedded_dataset_has_all_field_fallbacks() {
        let def = default_dataset();
        assert!(!def.fields.district_code.is_empty());
        assert!(!def.fields.district_name.is_empty());
        assert!(!def.fields.modality.is_empty());
        assert!(!def.fields.year.is_empty());
        assert!(!def.fields.month.is_empty());
        assert!(!def.fields.count.is_empty());
    }

    #[test]
    fn embedded_dataset_accepts_upstream_headers() {
        let def = default_dataset();
        assert_eq!(def.fields.district_code[0], "UBIGEO_HECHO");
        assert_eq!(def.fields.district_name[0], "DIST_HECHO");
        assert_eq!(def.fields.modality[0], "P_MODALIDADES");
        assert_eq!(def.fields.year[0], "ANIO");
        assert_eq!(def.fields.month[0], "MES");
        assert_eq!(def.fields.count[0], "cantidad");
    }

    #[test]
    fn delimiter_defaults_to_comma() {
        let def = default_dataset();
        assert_eq!(def.delimiter_byte(), b',');
    }

    #[test]
    fn custom_delimiter_parses() {
        let def = parse_dataset_toml(
            r#"
            id = "tsv"
            name = "Tab-separated variant"
            delimiter = "\t"

            [fields]
            district_code = ["code"]
            district_name = ["name"]
            modality = ["modality"]
            year = ["year"]
            month = ["month"]
            count = ["count"]
            "#,
        )
        .unwrap();
        assert_eq!(def.delimiter_byte(), b'\t');
    }

    #[test]
    fn rejects_definition_missing_fields_table() {
        let result = parse_dataset_toml(
            r#"
            id = "broken"
            name = "No fields"
            "#,
        );
        assert!(result.is_err());
    }
}
