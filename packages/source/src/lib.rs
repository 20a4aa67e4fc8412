#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Dataset definitions and the typed CSV incident reader.
//!
//! A [`dataset::DatasetDefinition`] describes one CSV export: which source
//! headers map to each canonical column. The reader resolves the mapping
//! against the file's header row and produces typed
//! [`robos_peru_incident_models::IncidentRecord`] rows; everything past
//! that boundary works with the typed relation only.

pub mod dataset;
pub mod reader;

use thiserror::Error;

/// Errors that can occur while reading a dataset.
#[derive(Debug, Error)]
pub enum SourceError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset definition TOML could not be parsed.
    #[error("Dataset definition error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file does not match the expected relation shape: a required
    /// column is missing or a value cannot be interpreted as its type.
    /// Always aborts the run before any aggregation happens.
    #[error("Schema error: {message}")]
    Schema {
        /// Description of what went wrong.
        message: String,
    },
}
