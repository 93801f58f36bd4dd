//! Unattended migration: same change as `migrate_appointments`, without the
//! confirmation prompt. Safe to run on every deploy.

use std::io;
use std::process::ExitCode;

use appointment_schema_migrator::cli;
use appointment_schema_migrator::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    appointment_schema_migrator::obs::init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    cli::run_unattended(&config, &mut io::stdout())
        .await
        .unwrap_or_else(|e| {
            eprintln!("❌ Failed to write output: {}", e);
            ExitCode::FAILURE
        })
}
