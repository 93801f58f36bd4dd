//! Bodies of the three binaries. Each takes its streams explicitly and
//! returns the process exit code, so the `main` functions only wire up
//! configuration and stdio.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use crate::config::Config;
use crate::console::{self, Remediation};
use crate::db::Database;
use crate::errors::{MigrationError, ResultExt};
use crate::migrator::{migrate, MigrationReport};
use crate::verifier::verify;

async fn connect(config: &Config) -> Result<Database, MigrationError> {
    Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Banner, yes/no prompt, then the migration. Anything but an affirmative
/// answer exits 0 without opening a connection.
pub async fn run_interactive(
    config: &Config,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<ExitCode> {
    console::write_banner(out, &config.table)?;

    if !console::confirm(input, out)? {
        writeln!(out, "Migration cancelled.")?;
        return Ok(ExitCode::SUCCESS);
    }

    let db = match connect(config).await {
        Ok(db) => db,
        Err(e) => return finish(config, Err(e), Remediation::Interactive, out),
    };
    writeln!(
        out,
        "\nDetected {} database. Performing migration...",
        db.engine().name()
    )?;

    let result = migrate(&db, &config.table).await;
    db.close().await;
    finish(config, result, Remediation::Interactive, out)
}

/// Same migration without the prompt.
pub async fn run_unattended(config: &Config, out: &mut impl Write) -> io::Result<ExitCode> {
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "{}", console::TITLE)?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "\nAdding new fields to {} table...", config.table)?;

    let result = match connect(config).await {
        Ok(db) => {
            let result = migrate(&db, &config.table).await;
            db.close().await;
            result
        }
        Err(e) => Err(e),
    };
    finish(config, result, Remediation::Unattended, out)
}

fn finish(
    config: &Config,
    result: Result<MigrationReport, MigrationError>,
    remediation: Remediation,
    out: &mut impl Write,
) -> io::Result<ExitCode> {
    match result {
        Ok(report) => {
            tracing::debug!(
                "Migration report: {}",
                serde_json::to_string(&report).unwrap_or_default()
            );
            console::write_migration_report(out, &report)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("Migration of '{}' failed: {}", config.table, e);
            console::write_failure(out, &e, remediation)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Prints the schema; exits 1 on error or when a required column is missing.
pub async fn run_verify(config: &Config, out: &mut impl Write) -> io::Result<ExitCode> {
    let result = match connect(config).await {
        Ok(db) => {
            let result = verify(&db, &config.table).await;
            db.close().await;
            result
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            console::write_verification(out, &report)?;
            Ok(if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(e) => {
            tracing::error!("Verification of '{}' failed: {}", config.table, e);
            console::write_verification_failure(out, &e)?;
            Ok(ExitCode::FAILURE)
        }
    }
}
