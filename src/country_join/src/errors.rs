//! Error types.

use code_registry::RegistryError;
use thiserror::Error;

/// The unified error type for the `country_join` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The code mapping could not be obtained.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A wide indicator table could not be reshaped.
    #[error("reshape failed: {0}")]
    Reshape(#[from] ReshapeError),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Input or output JSON was malformed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Problems with the shape of a wide per-year table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReshapeError {
    /// A value column header is not a 4-digit year.
    #[error("column {0:?} is not a 4-digit year")]
    InvalidYearColumn(String),

    /// A row does not have one value per year column.
    #[error("row {row} ({country}) has {found} values, expected {expected}")]
    RaggedRow {
        /// 0-based row index.
        row: usize,
        /// Identifier of the offending row.
        country: String,
        /// Number of values in the row.
        found: usize,
        /// Number of year columns.
        expected: usize,
    },

    /// A year column does not have one cell per identifier.
    #[error("column {column:?} has {found} cells, expected {expected}")]
    ColumnLength {
        /// Column header.
        column: String,
        /// Number of cells in the column.
        found: usize,
        /// Number of identifiers.
        expected: usize,
    },

    /// The identifier column is absent.
    #[error("missing identifier column {0:?}")]
    MissingIdColumn(String),

    /// A cell is neither a number, null, nor blank.
    #[error("column {column:?} row {row}: {value} is not a number")]
    InvalidValue {
        /// Column header.
        column: String,
        /// 0-based row index.
        row: usize,
        /// The raw value as JSON.
        value: String,
    },
}
