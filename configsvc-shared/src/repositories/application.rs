/// Application repository
///
/// CRUD over the `applications` table, plus the aggregate lookup that
/// returns an application together with its configuration identifiers.

use crate::db::pool::{DatabaseManager, DbError, SqlValue};
use crate::id::new_id;
use crate::models::application::{
    Application, ApplicationWithConfigs, CreateApplication, UpdateApplication,
};
use crate::repositories::{validate_id, validate_ids, RepositoryError, RepositoryResult};
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::sync::Arc;
use tracing::debug;

const INSERT: &str = r#"
    INSERT INTO applications (id, name, comments, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, comments, created_at, updated_at
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, name, comments, created_at, updated_at
    FROM applications
    WHERE id = $1
"#;

const SELECT_BY_ID_WITH_CONFIGS: &str = r#"
    SELECT
        a.id, a.name, a.comments, a.created_at, a.updated_at,
        COALESCE(
            array_agg(c.id::TEXT ORDER BY c.id) FILTER (WHERE c.id IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS configuration_ids
    FROM applications a
    LEFT JOIN configurations c ON a.id = c.application_id
    WHERE a.id = $1
    GROUP BY a.id, a.name, a.comments, a.created_at, a.updated_at
"#;

const SELECT_ALL: &str = r#"
    SELECT id, name, comments, created_at, updated_at
    FROM applications
    ORDER BY name
"#;

const UPDATE: &str = r#"
    UPDATE applications
    SET name = $2, comments = $3, updated_at = $4
    WHERE id = $1
    RETURNING id, name, comments, created_at, updated_at
"#;

const DELETE: &str = "DELETE FROM applications WHERE id = $1";

const DELETE_MANY: &str = "DELETE FROM applications WHERE id = ANY($1)";

const EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM applications WHERE id = $1) AS found";

/// Repository for application records
#[derive(Clone)]
pub struct ApplicationRepository {
    db: Arc<DatabaseManager>,
}

impl ApplicationRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Creates a new application
    ///
    /// # Returns
    ///
    /// The stored application with generated ID and equal timestamps
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Conflict`] if the name is already taken
    /// - [`RepositoryError::Storage`] for any other store failure
    pub async fn create(&self, data: CreateApplication) -> RepositoryResult<Application> {
        const CONTEXT: &str = "Failed to create application";

        let id = new_id();
        let now = Utc::now();
        let name = data.name.clone();

        let rows = self
            .db
            .execute_returning(
                INSERT,
                vec![
                    id.into(),
                    data.name.into(),
                    data.comments.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await
            .map_err(|e| conflict_or_storage(CONTEXT, &name, e))?;

        let application = rows
            .first()
            .map(map_application)
            .transpose()
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))?
            .ok_or_else(|| RepositoryError::missing_row(CONTEXT))?;

        debug!(application_id = %application.id, "Created application");
        Ok(application)
    }

    /// Finds an application by ID
    ///
    /// # Returns
    ///
    /// The application if found, None otherwise
    pub async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Application>> {
        const CONTEXT: &str = "Failed to get application";
        validate_id("application", id)?;

        let rows = self
            .db
            .query(SELECT_BY_ID, vec![id.into()])
            .await
            .map_err(|e| RepositoryError::storage(CONTEXT, e))?;

        rows.first()
            .map(map_application)
            .transpose()
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))
    }

    /// Finds an application and the IDs of all its configurations
    ///
    /// Uses a single aggregating join; `configuration_ids` is empty when the
    /// application has no configurations.
    pub async fn get_by_id_with_configs(
        &self,
        id: &str,
    ) -> RepositoryResult<Option<ApplicationWithConfigs>> {
        const CONTEXT: &str = "Failed to get application with configs";
        validate_id("application", id)?;

        let rows = self
            .db
            .query(SELECT_BY_ID_WITH_CONFIGS, vec![id.into()])
            .await
            .map_err(|e| RepositoryError::storage(CONTEXT, e))?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let with_configs = map_application(row)
            .and_then(|application| {
                Ok(ApplicationWithConfigs {
                    application,
                    configuration_ids: row.try_get("configuration_ids")?,
                })
            })
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))?;

        Ok(Some(with_configs))
    }

    /// Lists all applications, ordered by name
    pub async fn get_all(&self) -> RepositoryResult<Vec<Application>> {
        const CONTEXT: &str = "Failed to get applications";

        let rows = self
            .db
            .query(SELECT_ALL, vec![])
            .await
            .map_err(|e| RepositoryError::storage(CONTEXT, e))?;

        rows.iter()
            .map(map_application)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))
    }

    /// Replaces the mutable fields of an application
    ///
    /// # Returns
    ///
    /// The updated application, or None if no application has this ID
    pub async fn update(
        &self,
        id: &str,
        data: UpdateApplication,
    ) -> RepositoryResult<Option<Application>> {
        const CONTEXT: &str = "Failed to update application";
        validate_id("application", id)?;

        let name = data.name.clone();
        let rows = self
            .db
            .execute_returning(
                UPDATE,
                vec![
                    id.into(),
                    data.name.into(),
                    data.comments.into(),
                    Utc::now().into(),
                ],
            )
            .await
            .map_err(|e| conflict_or_storage(CONTEXT, &name, e))?;

        rows.first()
            .map(map_application)
            .transpose()
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))
    }

    /// Deletes an application by ID
    ///
    /// # Returns
    ///
    /// True if a row was removed, false if none matched
    pub async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        validate_id("application", id)?;

        let affected = self
            .db
            .execute(DELETE, vec![id.into()])
            .await
            .map_err(|e| RepositoryError::storage("Failed to delete application", e))?;

        Ok(affected > 0)
    }

    /// Deletes every application whose ID is in `ids`, in one statement
    ///
    /// An empty slice returns 0 without touching the store.
    ///
    /// # Returns
    ///
    /// Number of rows actually removed, which may be fewer than requested
    pub async fn delete_many(&self, ids: &[String]) -> RepositoryResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        validate_ids("application", ids)?;

        let affected = self
            .db
            .execute(DELETE_MANY, vec![SqlValue::TextArray(ids.to_vec())])
            .await
            .map_err(|e| RepositoryError::storage("Failed to delete applications", e))?;

        debug!(requested = ids.len(), deleted = affected, "Deleted applications");
        Ok(affected)
    }

    /// Checks whether an application exists
    pub async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        const CONTEXT: &str = "Failed to check application";
        validate_id("application", id)?;

        let rows = self
            .db
            .query(EXISTS, vec![id.into()])
            .await
            .map_err(|e| RepositoryError::storage(CONTEXT, e))?;

        match rows.first() {
            Some(row) => row
                .try_get("found")
                .map_err(|e| RepositoryError::storage(CONTEXT, e.into())),
            None => Ok(false),
        }
    }
}

fn conflict_or_storage(context: &'static str, name: &str, err: DbError) -> RepositoryError {
    if err.is_unique_violation() {
        RepositoryError::Conflict(format!("Application with name '{name}' already exists"))
    } else {
        RepositoryError::storage(context, err)
    }
}

fn map_application(row: &PgRow) -> Result<Application, sqlx::Error> {
    Ok(Application {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        comments: row.try_get("comments")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::DatabaseConfig;

    /// Repository over a manager that was never initialized: any store
    /// round-trip fails with `Uninitialized`.
    fn repository() -> ApplicationRepository {
        ApplicationRepository::new(Arc::new(DatabaseManager::new(DatabaseConfig {
            url: "postgresql://localhost/unused".to_string(),
            ..Default::default()
        })))
    }

    #[tokio::test]
    async fn test_delete_many_empty_skips_store() {
        assert_eq!(repository().delete_many(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_malformed_ids_rejected_before_store() {
        let repo = repository();

        assert!(matches!(
            repo.get_by_id("nope").await,
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            repo.get_by_id_with_configs("01ARZ3NDEKTSV4RRFFQ69G5FAU").await,
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            repo.update(
                "short",
                UpdateApplication {
                    name: "x".to_string(),
                    comments: None
                }
            )
            .await,
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            repo.delete("").await,
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            repo.delete_many(&["01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(), "bad".to_string()])
                .await,
            Err(RepositoryError::Validation(_))
        ));
        assert!(matches!(
            repo.exists("bad").await,
            Err(RepositoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_valid_ids_reach_store() {
        let repo = repository();

        assert!(matches!(
            repo.get_by_id("01ARZ3NDEKTSV4RRFFQ69G5FAV").await,
            Err(RepositoryError::Uninitialized)
        ));
        assert!(matches!(
            repo.create(CreateApplication {
                name: "svc-a".to_string(),
                comments: None,
            })
            .await,
            Err(RepositoryError::Uninitialized)
        ));
        assert!(matches!(
            repo.get_all().await,
            Err(RepositoryError::Uninitialized)
        ));
    }

    #[test]
    fn test_conflict_or_storage_passes_through_other_errors() {
        let err = conflict_or_storage("Failed to create application", "svc-a", DbError::Closed);
        assert!(matches!(err, RepositoryError::Storage { .. }));
    }
}
