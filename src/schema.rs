//! Schema introspection and the small amount of DDL text this tool generates.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use sqlx::FromRow;

use crate::db::{Database, Engine};
use crate::errors::{MigrationError, ResultExt};

/// Unquoted SQL identifier, at most 63 characters (the PostgreSQL limit).
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

/// A column as reported by the engine's introspection query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
}

/// Column types this tool knows how to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    DateTime,
}

impl SqlType {
    /// Type name as written in `ADD COLUMN` for the given engine.
    pub fn render(self, engine: Engine) -> &'static str {
        match (self, engine) {
            (SqlType::Text, _) => "TEXT",
            (SqlType::DateTime, Engine::Sqlite) => "DATETIME",
            (SqlType::DateTime, Engine::Postgres) => "TIMESTAMP",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Text => f.write_str("TEXT"),
            SqlType::DateTime => f.write_str("DATETIME"),
        }
    }
}

/// Checks that `name` is a plain identifier and returns it double-quoted.
pub fn quote_identifier(name: &str) -> Result<String, MigrationError> {
    if !IDENTIFIER.is_match(name) {
        return Err(MigrationError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}

/// Reads the current columns of `table`.
///
/// Fails with [`MigrationError::TableNotFound`] when the table does not exist;
/// both engines report that as an empty column list.
pub async fn introspect(
    db: &Database,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, MigrationError> {
    quote_identifier(table)?;

    let columns = db
        .fetch_columns(table)
        .await
        .with_context(|| format!("Failed to introspect table '{}'", table))?;

    if columns.is_empty() {
        return Err(MigrationError::TableNotFound(table.to_string()));
    }

    tracing::debug!(
        "Introspected {} columns on '{}': {:?}",
        columns.len(),
        table,
        columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    Ok(columns)
}
