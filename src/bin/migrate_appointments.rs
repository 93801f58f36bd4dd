//! Interactive migration: adds `rejection_reason` and `updated_at` to the
//! appointments table after the operator confirms.

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

    cli::run_interactive(&config, &mut io::stdin().lock(), &mut io::stdout())
        .await
        .unwrap_or_else(|e| {
            eprintln!("❌ Failed to write output: {}", e);
            ExitCode::FAILURE
        })
}
