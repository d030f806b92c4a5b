//! Storage module for persisting normalized rows
//!
//! This module handles all database operations, including:
//! - Validated table identifiers and per-layout SQL
//! - The SQLite row store
//! - Row loading with data-validity failures isolated per row

mod loader;
mod schema;
mod sqlite;
mod traits;

pub use loader::{load_row, LoadOutcome};
pub use schema::{create_table_sql, insert_sql, TableName};
pub use sqlite::SqliteStore;
pub use traits::{RowStore, StorageError, StorageResult};

use crate::config::DatabaseConfig;
use crate::HarvestError;
use std::path::Path;

/// Opens the configured store
///
/// The table name was already validated at configuration time; it is
/// parsed again here because [`TableName`] is the only way to reach SQL.
pub fn open_store(config: &DatabaseConfig) -> Result<SqliteStore, HarvestError> {
    let table = TableName::parse(&config.table)?;
    SqliteStore::open(Path::new(&config.path), table, config.variant)
}
