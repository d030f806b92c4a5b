//! Table identifiers and SQL text for the row layouts
//!
//! Values are always bound positionally. The table identifier is the only
//! text spliced into statements, and it can only be built through
//! [`TableName::parse`].

use crate::record::SchemaVariant;
use crate::ConfigError;
use std::fmt;

/// A validated SQL table identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Accepts `[A-Za-z_][A-Za-z0-9_]*`, at most 128 characters
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);

        if !valid_start
            || name.len() > 128
            || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::InvalidIdentifier(format!(
                "'{}' must match [A-Za-z_][A-Za-z0-9_]*",
                name
            )));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// DDL for a table in the given layout
///
/// Width limits become CHECK constraints so an oversized value is
/// rejected as a data-validity failure.
pub fn create_table_sql(table: &TableName, variant: SchemaVariant) -> String {
    let columns: Vec<String> = variant
        .columns()
        .iter()
        .map(|column| match column.width {
            Some(width) => format!(
                "    {name} TEXT CHECK ({name} IS NULL OR length({name}) <= {width})",
                name = column.name,
                width = width
            ),
            None => format!("    {} TEXT", column.name),
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n{}\n)",
        table,
        columns.join(",\n")
    )
}

/// Positional INSERT for the given layout
pub fn insert_sql(table: &TableName, variant: SchemaVariant) -> String {
    let columns = variant.columns();
    let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    )
}
