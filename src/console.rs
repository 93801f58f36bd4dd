//! Human-readable output for the migration binaries.
//!
//! Everything here writes to a caller-supplied writer so the binaries can use
//! stdout and tests can capture into a buffer. None of it is a machine
//! contract.

use std::io::{self, BufRead, Write};

use crate::errors::MigrationError;
use crate::migrator::{MigrationReport, DESIRED_COLUMNS};
use crate::verifier::{is_required, VerificationReport};

pub const TITLE: &str = "Appointment System Database Migration";

fn rule() -> String {
    "=".repeat(60)
}

/// Which set of recovery steps to print after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Operator is at the keyboard and may rebuild the database by hand.
    Interactive,
    /// Unattended run, most failures are environmental.
    Unattended,
}

/// Title block shown before the interactive prompt.
pub fn write_banner(out: &mut impl Write, table: &str) -> io::Result<()> {
    writeln!(out, "{}", rule())?;
    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", rule())?;
    writeln!(out)?;
    writeln!(out, "This will add the following fields to the {} table:", table)?;
    for column in &DESIRED_COLUMNS {
        writeln!(out, "  - {} ({})", column.name, column.sql_type)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", rule())
}

/// Only `yes` or `y`, ignoring case and surrounding whitespace, is consent.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Asks for confirmation and reads one line. EOF counts as a refusal.
pub fn confirm(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "\nProceed with migration? (yes/no): ")?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }
    Ok(is_affirmative(&answer))
}

/// Per-column status lines followed by the summary.
pub fn write_migration_report(out: &mut impl Write, report: &MigrationReport) -> io::Result<()> {
    for column in &DESIRED_COLUMNS {
        if report.added.contains(column.name) {
            writeln!(out, "  ✓ Added '{}' column", column.name)?;
        } else if report.already_present.contains(column.name) {
            writeln!(out, "  ✓ '{}' column already exists", column.name)?;
        }
    }
    if report.backfilled_rows > 0 {
        writeln!(
            out,
            "  ✓ Set updated_at = created_at on {} existing rows",
            report.backfilled_rows
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", rule())?;
    if report.changes_made() {
        writeln!(out, "✅ Migration completed successfully!")?;
        writeln!(out, "Your database is now ready to use the appointment system.")?;
    } else {
        writeln!(out, "✅ Database already up to date!")?;
    }
    writeln!(out, "{}", rule())
}

/// Diagnostic plus recovery steps. Engines this tool does not handle get the
/// schema-migration-tool handoff instead.
pub fn write_failure(
    out: &mut impl Write,
    err: &MigrationError,
    remediation: Remediation,
) -> io::Result<()> {
    if let MigrationError::UnsupportedEngine(engine) = err.root_cause() {
        return write_handoff(out, engine);
    }

    writeln!(out)?;
    writeln!(out, "❌ Migration failed: {}", err)?;
    writeln!(out)?;
    match remediation {
        Remediation::Interactive => {
            writeln!(out, "Alternative: You can recreate the database by:")?;
            writeln!(out, "  1. Backup your data")?;
            writeln!(out, "  2. Delete the database file")?;
            writeln!(out, "  3. Recreate the schema with your schema-migration tool")?;
        }
        Remediation::Unattended => {
            writeln!(out, "Troubleshooting:")?;
            writeln!(out, "  1. Make sure the appointment application is not running")?;
            writeln!(out, "  2. Check database file permissions")?;
            writeln!(out, "  3. Verify DATABASE_URL points at the application database")?;
        }
    }
    Ok(())
}

fn write_handoff(out: &mut impl Write, engine: &str) -> io::Result<()> {
    writeln!(out, "Non-SQLite, non-PostgreSQL database detected ({}).", engine)?;
    writeln!(out, "Please use your schema-migration tool for this change, e.g.:")?;
    writeln!(
        out,
        "  flask db migrate -m 'Add rejection_reason and updated_at to appointments'"
    )?;
    writeln!(out, "  flask db upgrade")
}

/// Verifier counterpart of [`write_failure`]; unsupported engines still get
/// the handoff.
pub fn write_verification_failure(out: &mut impl Write, err: &MigrationError) -> io::Result<()> {
    if let MigrationError::UnsupportedEngine(engine) = err.root_cause() {
        return write_handoff(out, engine);
    }
    writeln!(out, "❌ Verification failed: {}", err)
}

/// Column table with the required columns marked, then the verdict.
pub fn write_verification(out: &mut impl Write, report: &VerificationReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "{} Table Schema", capitalize(&report.table))?;
    writeln!(out, "{}", rule())?;
    for column in &report.columns {
        let marker = if is_required(&column.name) { "✓" } else { " " };
        writeln!(out, "{} {:<25} {}", marker, column.name, column.declared_type)?;
    }
    writeln!(out, "{}", rule())?;

    if report.is_complete() {
        writeln!(out, "✅ Migration successful! All required columns present.")?;
    } else {
        writeln!(out, "❌ Migration incomplete. Missing columns:")?;
        for name in &report.missing_required {
            writeln!(out, "  - {}", name)?;
        }
    }
    writeln!(out, "{}", rule())?;
    writeln!(out)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
