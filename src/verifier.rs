use std::collections::BTreeSet;

use serde::Serialize;

use crate::db::Database;
use crate::errors::MigrationError;
use crate::migrator::DESIRED_COLUMNS;
use crate::schema::{introspect, ColumnDescriptor};

/// Read-only view of the table after (or before) a migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub missing_required: BTreeSet<String>,
}

impl VerificationReport {
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// True for the columns the migration is responsible for.
pub fn is_required(column: &str) -> bool {
    DESIRED_COLUMNS
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(column))
}

/// Checks that every column the migration adds is present on `table`.
pub async fn verify(db: &Database, table: &str) -> Result<VerificationReport, MigrationError> {
    let columns = introspect(db, table).await?;

    let missing_required = DESIRED_COLUMNS
        .iter()
        .map(|c| c.name)
        .filter(|name| !columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)))
        .map(str::to_string)
        .collect();

    Ok(VerificationReport {
        table: table.to_string(),
        columns,
        missing_required,
    })
}
