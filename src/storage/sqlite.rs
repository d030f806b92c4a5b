//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RowStore trait.

use crate::record::{NormalizedRow, SchemaVariant};
use crate::storage::schema::{create_table_sql, insert_sql, TableName};
use crate::storage::traits::{RowStore, StorageError, StorageResult};
use crate::HarvestError;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;

/// SQLite row store bound to one table and layout
pub struct SqliteStore {
    conn: Connection,
    table: TableName,
    variant: SchemaVariant,
    insert_sql: String,
}

impl SqliteStore {
    /// Opens the database at `path` for writing into `table`
    ///
    /// The table is not created here; see [`SqliteStore::initialize_table`].
    pub fn open(path: &Path, table: TableName, variant: SchemaVariant) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Ok(Self::from_connection(conn, table, variant))
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(table: TableName, variant: SchemaVariant) -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, table, variant))
    }

    fn from_connection(conn: Connection, table: TableName, variant: SchemaVariant) -> Self {
        let insert_sql = insert_sql(&table, variant);
        Self {
            conn,
            table,
            variant,
            insert_sql,
        }
    }

    /// Creates the target table for this layout if it does not exist
    pub fn initialize_table(&self) -> StorageResult<()> {
        self.conn
            .execute_batch(&create_table_sql(&self.table, self.variant))?;
        Ok(())
    }

    /// Fails with [`StorageError::TableNotFound`] unless the target table exists
    pub fn ensure_table(&self) -> StorageResult<()> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![self.table.as_str()],
            |row| row.get(0),
        )?;

        if found == 0 {
            return Err(StorageError::TableNotFound(self.table.to_string()));
        }
        Ok(())
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Raw connection access (used by tests that shape the target table)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RowStore for SqliteStore {
    fn insert_row(&mut self, row: &NormalizedRow) -> StorageResult<()> {
        // Outside an explicit transaction each statement commits on its own.
        let mut stmt = self.conn.prepare_cached(&self.insert_sql)?;
        stmt.execute(params_from_iter(row.values_for(self.variant)))?;
        Ok(())
    }

    fn count_rows(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
