//! Appointment Schema Migrator Library
//!
//! Idempotent, additive schema migration for the `appointments` table of the
//! appointment-booking database, plus a read-only verifier. The binaries in
//! `src/bin` wrap these with console reporting.
//!
//! # Modules
//!
//! - `cli`: Bodies of the migrate/verify binaries.
//! - `config`: Configuration management.
//! - `console`: Human-readable progress and summary output.
//! - `db`: Database connection and engine selection.
//! - `errors`: Error handling types.
//! - `migrator`: The add-missing-columns procedure and its report.
//! - `obs`: Observability and logging.
//! - `schema`: Column introspection and identifier handling.
//! - `verifier`: Read-only check of the migration's postcondition.

pub mod cli;
pub mod config;
pub mod console;
pub mod db;
pub mod errors;
pub mod migrator;
pub mod obs;
pub mod schema;
pub mod verifier;

pub use db::{Database, Engine};
pub use errors::MigrationError;
pub use migrator::{migrate, MigrationReport, DEFAULT_TABLE, DESIRED_COLUMNS};
pub use schema::ColumnDescriptor;
pub use verifier::{verify, VerificationReport};
