use serde::Deserialize;

use crate::migrator::DEFAULT_TABLE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    /// Table to migrate; `appointments` unless overridden.
    pub table: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.contains(':') {
                        anyhow::bail!("DB_URL must be a URL such as sqlite://app.db");
                    }
                    Ok(url.trim().to_string())
                })?,
            table: std::env::var("MIGRATION_TABLE")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        };

        // Log successful configuration load (without credentials)
        tracing::debug!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL scheme: {}",
            config.database_url.split(':').next().unwrap_or_default()
        );
        tracing::debug!("Target table: {}", config.table);

        Ok(config)
    }
}
