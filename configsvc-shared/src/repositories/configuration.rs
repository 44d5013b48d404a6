/// Configuration repository
///
/// Configurations are stored with their payload in a `JSONB` column. Updates
/// replace every mutable field, as they do for applications.

use crate::db::pool::{DatabaseManager, DbError, SqlValue};
use crate::id::new_id;
use crate::models::configuration::{
    config_from_json, config_to_json, Configuration, CreateConfiguration, UpdateConfiguration,
};
use crate::repositories::{validate_id, validate_ids, RepositoryError, RepositoryResult};
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::sync::Arc;
use tracing::debug;

const COLUMNS: &str = "id, application_id, name, comments, config, created_at, updated_at";

/// Repository for configuration records
#[derive(Clone)]
pub struct ConfigurationRepository {
    db: Arc<DatabaseManager>,
}

impl ConfigurationRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Creates a new configuration under an existing application
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Validation`] if `application_id` is malformed
    /// - [`RepositoryError::NotFound`] if the application does not exist
    /// - [`RepositoryError::Conflict`] if the application already has a
    ///   configuration with this name
    pub async fn create(&self, data: CreateConfiguration) -> RepositoryResult<Configuration> {
        const CONTEXT: &str = "Failed to create configuration";
        validate_id("application", &data.application_id)?;

        let id = new_id();
        let now = Utc::now();
        let application_id = data.application_id.clone();
        let name = data.name.clone();

        let sql = format!(
            "INSERT INTO configurations ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );

        let rows = self
            .db
            .execute_returning(
                &sql,
                vec![
                    id.into(),
                    data.application_id.into(),
                    data.name.into(),
                    data.comments.into(),
                    SqlValue::Json(config_to_json(data.config)),
                    now.into(),
                    now.into(),
                ],
            )
            .await
            .map_err(|e| {
                if e.is_foreign_key_violation() {
                    RepositoryError::NotFound(format!(
                        "Application with ID '{application_id}' not found"
                    ))
                } else {
                    conflict_or_storage(CONTEXT, &name, e)
                }
            })?;

        let configuration = rows
            .first()
            .map(map_configuration)
            .transpose()
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))?
            .ok_or_else(|| RepositoryError::missing_row(CONTEXT))?;

        debug!(
            configuration_id = %configuration.id,
            application_id = %configuration.application_id,
            "Created configuration"
        );
        Ok(configuration)
    }

    /// Finds a configuration by ID
    pub async fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Configuration>> {
        const CONTEXT: &str = "Failed to get configuration";
        validate_id("configuration", id)?;

        let sql = format!("SELECT {COLUMNS} FROM configurations WHERE id = $1");
        let rows = self
            .db
            .query(&sql, vec![id.into()])
            .await
            .map_err(|e| RepositoryError::storage(CONTEXT, e))?;

        rows.first()
            .map(map_configuration)
            .transpose()
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))
    }

    /// Lists all configurations, ordered by name
    pub async fn get_all(&self) -> RepositoryResult<Vec<Configuration>> {
        let sql = format!("SELECT {COLUMNS} FROM configurations ORDER BY name");
        self.fetch_many("Failed to get configurations", &sql, vec![])
            .await
    }

    /// Lists the configurations of one application, ordered by name
    ///
    /// An unknown application yields an empty list.
    pub async fn get_by_application_id(
        &self,
        application_id: &str,
    ) -> RepositoryResult<Vec<Configuration>> {
        validate_id("application", application_id)?;

        let sql = format!(
            "SELECT {COLUMNS} FROM configurations WHERE application_id = $1 ORDER BY name"
        );
        self.fetch_many(
            "Failed to get configurations for application",
            &sql,
            vec![application_id.into()],
        )
        .await
    }

    /// Replaces the mutable fields of a configuration
    ///
    /// A `None` comment clears the stored one; `updated_at` always refreshes.
    ///
    /// # Returns
    ///
    /// The updated configuration, or None if no configuration has this ID
    pub async fn update(
        &self,
        id: &str,
        data: UpdateConfiguration,
    ) -> RepositoryResult<Option<Configuration>> {
        const CONTEXT: &str = "Failed to update configuration";
        validate_id("configuration", id)?;

        let name = data.name.clone();
        let sql = format!(
            "UPDATE configurations \
             SET name = $2, comments = $3, config = $4, updated_at = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );

        let rows = self
            .db
            .execute_returning(
                &sql,
                vec![
                    id.into(),
                    data.name.into(),
                    data.comments.into(),
                    SqlValue::Json(config_to_json(data.config)),
                    Utc::now().into(),
                ],
            )
            .await
            .map_err(|e| conflict_or_storage(CONTEXT, &name, e))?;

        rows.first()
            .map(map_configuration)
            .transpose()
            .map_err(|e| RepositoryError::storage(CONTEXT, e.into()))
    }

    /// Deletes a configuration by ID
    ///
    /// # Returns
    ///
    /// True if a row was removed, false if none matched
    pub async fn delete(&self, id: &str) -> RepositoryResult<bool> {
        validate_id("configuration", id)?;

        let affected = self
            .db
            .execute("DELETE FROM configurations WHERE id = $1", vec![id.into()])
            .await
            .map_err(|e| RepositoryError::storage("Failed to delete configuration", e))?;

        Ok(affected > 0)
    }

    /// Deletes every configuration whose ID is in `ids`, in one statement
    ///
    /// An empty slice returns 0 without touching the store.
    pub async fn delete_many(&self, ids: &[String]) -> RepositoryResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        validate_ids("configuration", ids)?;

        let affected = self
            .db
            .execute(
                "DELETE FROM configurations WHERE id = ANY($1)",
                vec![SqlValue::TextArray(ids.to_vec())],
            )
            .await
            .map_err(|e| RepositoryError::storage("Failed to delete configurations", e))?;

        debug!(requested = ids.len(), deleted = affected, "Deleted configurations");
        Ok(affected)
    }

    /// Deletes the listed configurations, restricted to one application
    ///
    /// IDs belonging to other applications are ignored.
    pub async fn delete_many_for_application(
        &self,
        application_id: &str,
        ids: &[String],
    ) -> RepositoryResult<u64> {
        validate_id("application", application_id)?;
        if ids.is_empty() {
            return Ok(0);
        }
        validate_ids("configuration", ids)?;

        let affected = self
            .db
            .execute(
                "DELETE FROM configurations WHERE application_id = $1 AND id = ANY($2)",
                vec![application_id.into(), SqlValue::TextArray(ids.to_vec())],
            )
            .await
            .map_err(|e| {
                RepositoryError::storage("Failed to delete configurations for application", e)
            })?;

        Ok(affected)
    }

    /// Checks whether a configuration exists
    pub async fn exists(&self, id: &str) -> RepositoryResult<bool> {
        const CONTEXT: &str = "Failed to check configuration";
        validate_id("configuration", id)?;

        let rows = self
            .db
            .query(
                "SELECT EXISTS (SELECT 1 FROM configurations WHERE id = $1) AS found",
                vec![id.into()],
            )
            .await
            .map_err(|e| RepositoryError::storage(CONTEXT, e))?;

        match rows.first() {
            Some(row) => row
                .try_get("found")
                .map_err(|e| RepositoryError::storage(CONTEXT, e.into())),
            None => Ok(false),
        }
    }

    async fn fetch_many(
        &self,
        context: &'static str,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> RepositoryResult<Vec<Configuration>> {
        let rows = self
            .db
            .query(sql, params)
            .await
            .map_err(|e| RepositoryError::storage(context, e))?;

        rows.iter()
            .map(map_configuration)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::storage(context, e.into()))
    }
}

fn conflict_or_storage(context: &'static str, name: &str, err: DbError) -> RepositoryError {
    if err.is_unique_violation() {
        RepositoryError::Conflict(format!(
            "Configuration with name '{name}' already exists for this application"
        ))
    } else {
        RepositoryError::storage(context, err)
    }
}

fn map_configuration(row: &PgRow) -> Result<Configuration, sqlx::Error> {
    let config: JsonValue = row.try_get("config")?;

    Ok(Configuration {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        name: row.try_get("name")?,
        comments: row.try_get("comments")?,
        config: config_from_json(config),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
