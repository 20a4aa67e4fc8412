#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `DuckDB` sink for the derived reporting relations.
//!
//! Each pipeline run replaces five named tables wholesale; a table's
//! prior contents survive any failed write because every replace runs
//! inside its own transaction.

pub mod report_db;

use thiserror::Error;

/// Errors that can occur during sink operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// `DuckDB` operation failed.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (directory creation).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
