//! Prints the appointments table schema and checks that the migrated columns
//! exist. Never writes to the database.

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

    cli::run_verify(&config, &mut io::stdout())
        .await
        .unwrap_or_else(|e| {
            eprintln!("❌ Failed to write output: {}", e);
            ExitCode::FAILURE
        })
}
