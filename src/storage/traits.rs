//! Storage traits and error types
//!
//! This module defines the trait interface for row stores and the error
//! classification the loader depends on.

use crate::record::NormalizedRow;
use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Extended result code for a STRICT-table datatype violation
const SQLITE_CONSTRAINT_DATATYPE: i32 = ffi::SQLITE_CONSTRAINT | (12 << 8);

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store rejected the row's values (width or type); recoverable per row
    #[error("Data validity error: {0}")]
    DataValidity(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if is_data_validity(&err) {
            StorageError::DataValidity(err.to_string())
        } else {
            StorageError::Sqlite(err)
        }
    }
}

impl StorageError {
    pub fn is_data_validity(&self) -> bool {
        matches!(self, Self::DataValidity(_))
    }
}

/// Whether an SQLite failure means "these values do not fit this table"
///
/// CHECK constraints (column widths), datatype and size violations count;
/// NOT NULL, UNIQUE, foreign keys, I/O and locking do not.
fn is_data_validity(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => match e.code {
            ErrorCode::ConstraintViolation => matches!(
                e.extended_code,
                ffi::SQLITE_CONSTRAINT_CHECK | SQLITE_CONSTRAINT_DATATYPE
            ),
            ErrorCode::TypeMismatch | ErrorCode::TooBig => true,
            _ => false,
        },
        _ => false,
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for row store implementations
///
/// Writes are row-at-a-time: every successful `insert_row` is already
/// committed when it returns.
pub trait RowStore {
    /// Inserts one row into the target table and commits it
    fn insert_row(&mut self, row: &NormalizedRow) -> StorageResult<()>;

    /// Counts rows currently in the target table
    fn count_rows(&self) -> StorageResult<u64>;
}
