use sqlx::{
    postgres::PgPoolOptions, sqlite::SqlitePoolOptions, PgPool, SqlitePool,
};

use crate::errors::MigrationError;
use crate::schema::ColumnDescriptor;

const SQLITE_COLUMNS: &str =
    "SELECT name, type AS declared_type FROM pragma_table_info(?1) ORDER BY cid";

const POSTGRES_COLUMNS: &str = r#"
    SELECT column_name::text AS name, data_type::text AS declared_type
    FROM information_schema.columns
    WHERE table_schema = current_schema() AND table_name = $1
    ORDER BY ordinal_position
"#;

/// SQL engine behind a connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Sqlite,
    Postgres,
}

impl Engine {
    /// Picks the engine from the URL scheme.
    ///
    /// Anything other than SQLite or PostgreSQL is rejected so the caller can
    /// hand the change over to a full schema-migration tool instead.
    pub fn from_url(url: &str) -> Result<Self, MigrationError> {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Ok(Engine::Sqlite),
            "postgres" | "postgresql" => Ok(Engine::Postgres),
            _ => Err(MigrationError::UnsupportedEngine(scheme)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Engine::Sqlite => "SQLite",
            Engine::Postgres => "PostgreSQL",
        }
    }
}

/// Opened database handle, passed explicitly into the migrator and verifier.
#[derive(Debug, Clone)]
pub enum Database {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl Database {
    /// Connects to the database named by `database_url`.
    ///
    /// The pool is capped at a single connection: every statement runs in the
    /// same session, one after another.
    pub async fn connect(database_url: &str) -> Result<Self, MigrationError> {
        let db = match Engine::from_url(database_url)? {
            Engine::Sqlite => Database::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect(database_url)
                    .await?,
            ),
            Engine::Postgres => Database::Postgres(
                PgPoolOptions::new()
                    .max_connections(1)
                    .connect(database_url)
                    .await?,
            ),
        };

        tracing::info!("Connected to {} database", db.engine().name());
        Ok(db)
    }

    pub fn engine(&self) -> Engine {
        match self {
            Database::Sqlite(_) => Engine::Sqlite,
            Database::Postgres(_) => Engine::Postgres,
        }
    }

    /// Reads the column list of `table` in ordinal order. A missing table
    /// yields an empty list.
    pub(crate) async fn fetch_columns(
        &self,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
        match self {
            Database::Sqlite(pool) => {
                sqlx::query_as::<_, ColumnDescriptor>(SQLITE_COLUMNS)
                    .bind(table)
                    .fetch_all(pool)
                    .await
            }
            Database::Postgres(pool) => {
                sqlx::query_as::<_, ColumnDescriptor>(POSTGRES_COLUMNS)
                    .bind(table)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Runs `statements` in order inside one transaction and returns the
    /// rows affected by each.
    pub(crate) async fn execute_in_transaction(
        &self,
        statements: &[String],
    ) -> Result<Vec<u64>, sqlx::Error> {
        let mut affected = Vec::with_capacity(statements.len());

        match self {
            Database::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                for sql in statements {
                    tracing::debug!("Executing: {}", sql);
                    let result = sqlx::query(sql).execute(&mut *tx).await?;
                    affected.push(result.rows_affected());
                }
                tx.commit().await?;
            }
            Database::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                for sql in statements {
                    tracing::debug!("Executing: {}", sql);
                    let result = sqlx::query(sql).execute(&mut *tx).await?;
                    affected.push(result.rows_affected());
                }
                tx.commit().await?;
            }
        }

        Ok(affected)
    }

    pub async fn close(&self) {
        match self {
            Database::Sqlite(pool) => pool.close().await,
            Database::Postgres(pool) => pool.close().await,
        }
    }
}

impl From<SqlitePool> for Database {
    fn from(pool: SqlitePool) -> Self {
        Database::Sqlite(pool)
    }
}
