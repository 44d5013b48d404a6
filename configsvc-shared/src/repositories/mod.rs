/// Repositories mapping domain records to parameterized SQL
///
/// Each repository is a thin, stateless mapper over a shared
/// [`DatabaseManager`](crate::db::pool::DatabaseManager). Every repository call
/// is its own transaction; nothing spans two calls.
///
/// Identifiers coming from callers are validated before any SQL is sent, and
/// driver errors never leave this module: they are classified into
/// [`RepositoryError`].
///
/// # Example
///
/// ```no_run
/// use configsvc_shared::db::pool::{DatabaseConfig, DatabaseManager};
/// use configsvc_shared::models::application::CreateApplication;
/// use configsvc_shared::repositories::application::ApplicationRepository;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(DatabaseManager::new(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// }));
/// db.initialize().await?;
///
/// let applications = ApplicationRepository::new(Arc::clone(&db));
/// let app = applications
///     .create(CreateApplication {
///         name: "svc-a".to_string(),
///         comments: None,
///     })
///     .await?;
/// println!("Created application {}", app.id);
/// # Ok(())
/// # }
/// ```

pub mod application;
pub mod configuration;

use crate::db::pool::DbError;
use crate::id;
use thiserror::Error;
use tracing::error;

/// Repository result type alias
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository-level failures
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Malformed identifier or input
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// The database manager was used before `initialize`
    #[error("Database pool not initialized")]
    Uninitialized,

    /// Any other store failure, with the underlying cause
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: DbError,
    },
}

impl RepositoryError {
    /// Wraps a store error that needs no further classification
    pub(crate) fn storage(context: &'static str, source: DbError) -> Self {
        match source {
            DbError::Uninitialized => RepositoryError::Uninitialized,
            source => {
                error!(context, error = %source, "Repository operation failed");
                RepositoryError::Storage { context, source }
            }
        }
    }

    /// Storage failure for a statement that unexpectedly returned no row
    pub(crate) fn missing_row(context: &'static str) -> Self {
        Self::storage(context, DbError::Sqlx(sqlx::Error::RowNotFound))
    }
}

/// Rejects malformed identifiers before they reach SQL
pub(crate) fn validate_id(kind: &str, value: &str) -> RepositoryResult<()> {
    id::parse_id(value)
        .map(|_| ())
        .map_err(|e| RepositoryError::Validation(format!("Invalid {kind} ID format: {e}")))
}

/// Validates every identifier of a bulk request
pub(crate) fn validate_ids(kind: &str, values: &[String]) -> RepositoryResult<()> {
    values.iter().try_for_each(|value| validate_id(kind, value))
}
