//! Idempotent, additive migration of the appointments table
//!
//! Brings the table from the old column set to the new one:
//! 1. Introspect the current columns
//! 2. Add every desired column that is missing
//! 3. Backfill `updated_at` from `created_at` when it was just added
//!
//! Each added column is committed on its own, so an interrupted run leaves a
//! state that the next run simply completes.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{Database, Engine};
use crate::errors::{MigrationError, ResultExt};
use crate::schema::{introspect, quote_identifier, SqlType};

/// Table migrated when no other is configured.
pub const DEFAULT_TABLE: &str = "appointments";

/// A column the migration makes sure exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredColumn {
    pub name: &'static str,
    pub sql_type: SqlType,
    /// Existing column copied into this one, for rows where it is NULL,
    /// right after the column is added.
    pub backfill_from: Option<&'static str>,
}

impl DesiredColumn {
    fn add_statement(&self, quoted_table: &str, engine: Engine) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            quoted_table,
            self.name,
            self.sql_type.render(engine)
        )
    }

    fn backfill_statement(&self, quoted_table: &str, source: &str) -> String {
        format!(
            "UPDATE {table} SET {col} = {source} WHERE {col} IS NULL",
            table = quoted_table,
            col = self.name,
            source = source
        )
    }
}

/// Columns added by this migration, in the order they are applied.
pub const DESIRED_COLUMNS: [DesiredColumn; 2] = [
    DesiredColumn {
        name: "rejection_reason",
        sql_type: SqlType::Text,
        backfill_from: None,
    },
    DesiredColumn {
        name: "updated_at",
        sql_type: SqlType::DateTime,
        backfill_from: Some("created_at"),
    },
];

/// Outcome of a single [`migrate`] run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub table: String,
    pub added: BTreeSet<String>,
    pub already_present: BTreeSet<String>,
    /// Rows whose `updated_at` was filled from `created_at`.
    pub backfilled_rows: u64,
    pub completed_at: DateTime<Utc>,
}

impl MigrationReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            added: BTreeSet::new(),
            already_present: BTreeSet::new(),
            backfilled_rows: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn changes_made(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Adds the missing [`DESIRED_COLUMNS`] to `table`.
///
/// The first failure aborts the run and is returned as is; columns committed
/// before it stay in place.
pub async fn migrate(db: &Database, table: &str) -> Result<MigrationReport, MigrationError> {
    let quoted_table = quote_identifier(table)?;
    let engine = db.engine();

    // Column names are case-insensitive on both engines for unquoted names.
    let existing: HashSet<String> = introspect(db, table)
        .await?
        .iter()
        .map(|c| c.name.to_ascii_lowercase())
        .collect();

    let mut report = MigrationReport::new(table);

    for column in &DESIRED_COLUMNS {
        if existing.contains(column.name) {
            tracing::info!("'{}' column already exists on '{}'", column.name, table);
            report.already_present.insert(column.name.to_string());
            continue;
        }

        // The ALTER and its backfill share one commit; a crash in between
        // would otherwise leave NULLs that no later run revisits.
        let mut statements = vec![column.add_statement(&quoted_table, engine)];
        if let Some(source) = column.backfill_from {
            statements.push(column.backfill_statement(&quoted_table, source));
        }

        tracing::info!("Adding '{}' column to '{}'", column.name, table);
        let affected = db
            .execute_in_transaction(&statements)
            .await
            .with_context(|| format!("Failed to add column '{}' to '{}'", column.name, table))?;

        if column.backfill_from.is_some() {
            let rows = affected.last().copied().unwrap_or(0);
            tracing::info!("Backfilled '{}' on {} existing rows", column.name, rows);
            report.backfilled_rows += rows;
        }

        report.added.insert(column.name.to_string());
    }

    report.completed_at = Utc::now();
    Ok(report)
}
