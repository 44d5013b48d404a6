/// Database migration runner
///
/// Applies SQL scripts from a directory exactly once each, in lexicographic
/// filename order, and records every applied filename in a tracking table.
///
/// # Migration Files
///
/// Scripts live in a flat directory (by default `migrations/` at the project
/// root). The runner does not parse them; name them with a sortable prefix so
/// that filename order is apply order:
/// - `001_create_applications.sql`
/// - `002_create_configurations.sql`
///
/// Migrations are forward-only: there is no rollback of an applied script.
///
/// # Example
///
/// ```no_run
/// use configsvc_shared::db::migrations::MigrationRunner;
/// use configsvc_shared::db::pool::{DatabaseConfig, DatabaseManager};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = Arc::new(DatabaseManager::new(DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     }));
///     db.initialize().await?;
///
///     let runner = MigrationRunner::new(Arc::clone(&db), "migrations");
///     let applied = runner.run_all().await?;
///     println!("Applied {} migrations", applied.len());
///
///     db.close().await;
///     Ok(())
/// }
/// ```

use crate::db::pool::{DatabaseManager, DbError, SqlValue, Statement};
use sqlx::Row;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the tracking table
pub const MIGRATIONS_TABLE: &str = "migrations";

const CREATE_TRACKING_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS migrations (
        id SERIAL PRIMARY KEY,
        filename VARCHAR(255) NOT NULL UNIQUE,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )";

const SELECT_APPLIED: &str = "SELECT filename FROM migrations ORDER BY filename";

const RECORD_APPLIED: &str = "INSERT INTO migrations (filename) VALUES ($1)";

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The script is not present in the migrations directory
    #[error("Migration file {filename} not found")]
    NotFound { filename: String },

    /// The script exists but could not be read
    #[error("Failed to read migration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script or its tracking insert was rejected by the database
    #[error("Failed to apply migration {filename}: {source}")]
    Apply {
        filename: String,
        #[source]
        source: DbError,
    },

    /// Tracking table could not be created or read
    #[error("Migration tracking failed: {0}")]
    Tracking(#[from] DbError),
}

/// Migration status information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Filenames recorded in the tracking table
    pub applied: Vec<String>,

    /// Filenames present in the migrations directory, in apply order
    pub available: Vec<String>,

    /// Available filenames not yet applied, in apply order
    pub pending: Vec<String>,
}

impl MigrationStatus {
    /// Whether every available script has been applied
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies pending scripts through a [`DatabaseManager`]
pub struct MigrationRunner {
    db: Arc<DatabaseManager>,
    directory: PathBuf,
}

impl MigrationRunner {
    /// Creates a runner reading scripts from `directory`
    pub fn new(db: Arc<DatabaseManager>, directory: impl Into<PathBuf>) -> Self {
        Self {
            db,
            directory: directory.into(),
        }
    }

    /// Directory scripts are read from
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Creates the tracking table if it does not exist yet
    ///
    /// Safe to call on every start-up.
    pub async fn ensure_tracking_table(&self) -> Result<(), MigrationError> {
        self.db.execute(CREATE_TRACKING_TABLE, vec![]).await?;
        debug!(table = MIGRATIONS_TABLE, "Migrations table initialized");
        Ok(())
    }

    /// Filenames already recorded as applied
    pub async fn list_applied(&self) -> Result<BTreeSet<String>, MigrationError> {
        let rows = self.db.query(SELECT_APPLIED, vec![]).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("filename"))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| MigrationError::Tracking(DbError::from(e)))
    }

    /// Script filenames in the migrations directory, sorted lexicographically
    ///
    /// Only regular files are listed. A missing directory yields an empty list.
    pub async fn list_available(&self) -> Result<Vec<String>, MigrationError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    directory = %self.directory.display(),
                    "Migrations directory does not exist"
                );
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(MigrationError::Io {
                    path: self.directory.clone(),
                    source,
                })
            }
        };

        let io_error = |source: std::io::Error| MigrationError::Io {
            path: self.directory.clone(),
            source,
        };

        let mut filenames = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            if !entry.file_type().await.map_err(io_error)?.is_file() {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => filenames.push(name),
                Err(name) => warn!(filename = ?name, "Skipping non UTF-8 migration filename"),
            }
        }

        filenames.sort();
        Ok(filenames)
    }

    /// Applies one script and records it, atomically
    ///
    /// The script text and the tracking insert run in the same transaction,
    /// so a failure leaves neither the schema change nor the record behind.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::NotFound`] if `filename` is not a file in the directory
    /// - [`MigrationError::Io`] if it cannot be read
    /// - [`MigrationError::Apply`] if the database rejects it
    pub async fn apply(&self, filename: &str) -> Result<(), MigrationError> {
        let path = self.script_path(filename)?;

        let script = match tokio::fs::read_to_string(&path).await {
            Ok(script) => script,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MigrationError::NotFound {
                    filename: filename.to_string(),
                })
            }
            Err(source) => return Err(MigrationError::Io { path, source }),
        };

        self.db
            .transaction(vec![
                Statement::Script(script),
                Statement::command(RECORD_APPLIED, vec![SqlValue::from(filename)]),
            ])
            .await
            .map_err(|source| {
                warn!(filename, error = %source, "Failed to apply migration");
                MigrationError::Apply {
                    filename: filename.to_string(),
                    source,
                }
            })?;

        info!(filename, "Applied migration");
        Ok(())
    }

    /// Applies every pending script in order
    ///
    /// Stops at the first failure and returns it; later scripts stay pending.
    ///
    /// # Returns
    ///
    /// Filenames applied by this call, in order
    pub async fn run_all(&self) -> Result<Vec<String>, MigrationError> {
        info!(directory = %self.directory.display(), "Starting database migrations");

        self.ensure_tracking_table().await?;

        let applied = self.list_applied().await?;
        let available = self.list_available().await?;
        let pending = pending_migrations(&available, &applied);

        if pending.is_empty() {
            info!("No pending migrations");
            return Ok(pending);
        }

        for filename in &pending {
            self.apply(filename).await?;
        }

        info!(count = pending.len(), "All database migrations completed successfully");
        Ok(pending)
    }

    /// Gets the current migration status
    pub async fn status(&self) -> Result<MigrationStatus, MigrationError> {
        self.ensure_tracking_table().await?;

        let applied = self.list_applied().await?;
        let available = self.list_available().await?;
        let pending = pending_migrations(&available, &applied);

        Ok(MigrationStatus {
            applied: applied.into_iter().collect(),
            available,
            pending,
        })
    }

    fn script_path(&self, filename: &str) -> Result<PathBuf, MigrationError> {
        // Scripts are addressed by bare filename only
        let is_bare = !filename.is_empty()
            && Path::new(filename).file_name().and_then(|n| n.to_str()) == Some(filename);

        if !is_bare {
            return Err(MigrationError::NotFound {
                filename: filename.to_string(),
            });
        }

        Ok(self.directory.join(filename))
    }
}

/// `available - applied`, keeping the order of `available`
pub fn pending_migrations(available: &[String], applied: &BTreeSet<String>) -> Vec<String> {
    available
        .iter()
        .filter(|filename| !applied.contains(*filename))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::DatabaseConfig;

    fn runner(directory: &Path) -> MigrationRunner {
        let db = DatabaseManager::new(DatabaseConfig {
            url: "postgresql://localhost/unused".to_string(),
            ..Default::default()
        });
        MigrationRunner::new(Arc::new(db), directory)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pending_migrations_preserves_available_order() {
        let available = names(&["001_a.sql", "002_b.sql", "003_c.sql"]);
        let applied: BTreeSet<String> = names(&["002_b.sql", "999_gone.sql"]).into_iter().collect();

        assert_eq!(
            pending_migrations(&available, &applied),
            names(&["001_a.sql", "003_c.sql"])
        );
    }

    #[test]
    fn test_pending_migrations_all_applied() {
        let available = names(&["001_a.sql", "002_b.sql"]);
        let applied: BTreeSet<String> = available.iter().cloned().collect();
        assert!(pending_migrations(&available, &applied).is_empty());
    }

    #[test]
    fn test_migration_status_up_to_date() {
        let status = MigrationStatus {
            applied: names(&["001_a.sql"]),
            available: names(&["001_a.sql"]),
            pending: vec![],
        };
        assert!(status.is_up_to_date());
    }

    #[tokio::test]
    async fn test_list_available_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&dir.path().join("does-not-exist"));

        let available = runner.list_available().await.unwrap();
        assert!(available.is_empty());
    }

    #[tokio::test]
    async fn test_list_available_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("010_later.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("002_b.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("001_a.sql"), "SELECT 1;").unwrap();
        std::fs::create_dir(dir.path().join("003_directory")).unwrap();

        let available = runner(dir.path()).list_available().await.unwrap();
        assert_eq!(available, names(&["001_a.sql", "002_b.sql", "010_later.sql"]));
    }

    #[tokio::test]
    async fn test_apply_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = runner(dir.path()).apply("001_missing.sql").await;

        assert!(matches!(
            result,
            Err(MigrationError::NotFound { filename }) if filename == "001_missing.sql"
        ));
    }

    #[tokio::test]
    async fn test_apply_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());

        for bad in ["", "../001_a.sql", "nested/001_a.sql"] {
            assert!(
                matches!(runner.apply(bad).await, Err(MigrationError::NotFound { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_apply_needs_initialized_pool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001_a.sql"), "CREATE TABLE a (id INT);").unwrap();

        let result = runner(dir.path()).apply("001_a.sql").await;
        assert!(matches!(
            result,
            Err(MigrationError::Apply {
                source: DbError::Uninitialized,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_run_all_needs_initialized_pool() {
        let dir = tempfile::tempdir().unwrap();
        let result = runner(dir.path()).run_all().await;

        assert!(matches!(
            result,
            Err(MigrationError::Tracking(DbError::Uninitialized))
        ));
    }
}
