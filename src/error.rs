//! Error types for the dashboard pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{Field, Value};

#[derive(Debug, Error)]
pub enum Error {
    /// The input file does not exist.
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("IO error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A cell could not be parsed and the load runs under the reject policy.
    #[error("parse error in '{}' at row {row}, column '{column}': {value:?}", path.display())]
    Parse {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("'{}' has no column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// The predicate value is not part of the column's selectable domain.
    #[error("'{value}' is not a selectable value for {field}")]
    InvalidSelection { field: Field, value: Value },

    #[error("column {field} is not available for this dataset")]
    UnsupportedField { field: Field },

    #[error("invalid grouping: {0}")]
    InvalidGrouping(String),

    #[error("unknown summary column: {0}")]
    UnknownColumn(String),
}

pub type Result<T> = std::result::Result<T, Error>;
