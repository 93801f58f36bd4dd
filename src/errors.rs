use std::fmt;

/// Errors raised while inspecting or migrating the appointments schema.
#[derive(Debug)]
pub enum MigrationError {
    /// Introspection, DDL or DML failure against the store, including an
    /// unreachable database.
    Database(sqlx::Error),
    /// The target table does not exist (introspection returned no columns).
    TableNotFound(String),
    /// The table name is not a plain SQL identifier.
    InvalidIdentifier(String),
    /// The connection URL names an engine this tool does not migrate.
    UnsupportedEngine(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<MigrationError>,
        /// Additional context message.
        context: String,
    },
}

impl MigrationError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root_cause(&self) -> &MigrationError {
        match self {
            MigrationError::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the failure came from executing a statement against the store.
    pub fn is_operation_failure(&self) -> bool {
        matches!(
            self.root_cause(),
            MigrationError::Database(_) | MigrationError::TableNotFound(_)
        )
    }
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::Database(e) => write!(f, "Database error: {}", e),
            MigrationError::TableNotFound(table) => {
                write!(f, "Table not found: {}", table)
            }
            MigrationError::InvalidIdentifier(name) => {
                write!(f, "Invalid table name: {:?}", name)
            }
            MigrationError::UnsupportedEngine(scheme) => {
                write!(f, "Unsupported database engine: {}", scheme)
            }
            MigrationError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::Database(e) => Some(e),
            MigrationError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for MigrationError {
    fn from(err: sqlx::Error) -> Self {
        MigrationError::Database(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `MigrationError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, MigrationError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, MigrationError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, MigrationError> {
    fn context(self, context: impl Into<String>) -> Result<T, MigrationError> {
        self.map_err(|e| MigrationError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, MigrationError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| MigrationError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, MigrationError> {
        self.map_err(|e| MigrationError::WithContext {
            source: Box::new(MigrationError::Database(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, MigrationError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| MigrationError::WithContext {
            source: Box::new(MigrationError::Database(e)),
            context: f(),
        })
    }
}
