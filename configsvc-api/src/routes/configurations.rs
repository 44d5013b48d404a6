/// Configuration endpoints, scoped to one application
///
/// # Endpoints
///
/// - `POST /api/v1/applications/:app_id/configurations` - Create configuration
/// - `GET /api/v1/applications/:app_id/configurations` - List configurations
/// - `GET /api/v1/applications/:app_id/configurations/:id` - Get configuration
/// - `PUT /api/v1/applications/:app_id/configurations/:id` - Replace configuration fields
/// - `DELETE /api/v1/applications/:app_id/configurations/:id` - Delete configuration
/// - `DELETE /api/v1/applications/:app_id/configurations` - Bulk delete by `{"ids": [...]}`
///
/// A configuration that exists under a different application is reported as
/// not found.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{BulkDeleteRequest, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use configsvc_shared::models::configuration::{
    ConfigMap, Configuration, CreateConfiguration, UpdateConfiguration,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Create or replace configuration request
#[derive(Debug, Deserialize, Validate)]
pub struct ConfigurationRequest {
    /// Name, unique within the application
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,

    /// Free-form comments
    #[validate(length(max = 1024, message = "Comments must be at most 1024 characters"))]
    pub comments: Option<String>,

    /// Key-value payload; empty when omitted
    #[serde(default)]
    pub config: ConfigMap,
}

/// Create configuration
///
/// # Errors
///
/// - `400 Bad Request`: Malformed application ID or validation failed
/// - `404 Not Found`: No such application
/// - `409 Conflict`: Name already used within the application
pub async fn create_configuration(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    ValidatedJson(req): ValidatedJson<ConfigurationRequest>,
) -> ApiResult<(StatusCode, Json<Configuration>)> {
    let configuration = state
        .configurations
        .create(CreateConfiguration {
            application_id: app_id,
            name: req.name,
            comments: req.comments,
            config: req.config,
        })
        .await?;

    info!(
        configuration_id = %configuration.id,
        application_id = %configuration.application_id,
        "Configuration created"
    );

    Ok((StatusCode::CREATED, Json(configuration)))
}

/// List the configurations of an application
///
/// # Errors
///
/// - `400 Bad Request`: Malformed application ID
/// - `404 Not Found`: No such application
pub async fn list_configurations(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
) -> ApiResult<Json<Vec<Configuration>>> {
    if !state.applications.exists(&app_id).await? {
        return Err(ApiError::NotFound(format!(
            "Application with ID '{app_id}' not found"
        )));
    }

    Ok(Json(
        state.configurations.get_by_application_id(&app_id).await?,
    ))
}

/// Get configuration
pub async fn get_configuration(
    State(state): State<AppState>,
    Path((app_id, id)): Path<(String, String)>,
) -> ApiResult<Json<Configuration>> {
    let configuration = state
        .configurations
        .get_by_id(&id)
        .await?
        .filter(|c| c.application_id == app_id)
        .ok_or_else(|| configuration_not_found(&id))?;

    Ok(Json(configuration))
}

/// Replace configuration fields
///
/// Omitted `comments` are cleared and an omitted `config` becomes empty.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed ID or validation failed
/// - `404 Not Found`: No such configuration under this application
/// - `409 Conflict`: New name already used within the application
pub async fn update_configuration(
    State(state): State<AppState>,
    Path((app_id, id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<ConfigurationRequest>,
) -> ApiResult<Json<Configuration>> {
    ensure_owned(&state, &app_id, &id).await?;

    state
        .configurations
        .update(
            &id,
            UpdateConfiguration {
                name: req.name,
                comments: req.comments,
                config: req.config,
            },
        )
        .await?
        .map(Json)
        .ok_or_else(|| configuration_not_found(&id))
}

/// Delete configuration
pub async fn delete_configuration(
    State(state): State<AppState>,
    Path((app_id, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    ensure_owned(&state, &app_id, &id).await?;

    if !state.configurations.delete(&id).await? {
        return Err(configuration_not_found(&id));
    }

    info!(configuration_id = %id, application_id = %app_id, "Configuration deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk delete configurations of one application
///
/// # Errors
///
/// - `400 Bad Request`: Missing or empty `ids`, or a malformed ID
/// - `404 Not Found`: None of the IDs matched within this application
pub async fn delete_configurations(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    ValidatedJson(req): ValidatedJson<BulkDeleteRequest>,
) -> ApiResult<StatusCode> {
    let deleted = state
        .configurations
        .delete_many_for_application(&app_id, &req.ids)
        .await?;

    if deleted == 0 {
        return Err(ApiError::NotFound(
            "No configurations found to delete".to_string(),
        ));
    }

    info!(application_id = %app_id, requested = req.ids.len(), deleted, "Configurations deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Fails with 404 unless `id` names a configuration of `app_id`
async fn ensure_owned(state: &AppState, app_id: &str, id: &str) -> ApiResult<()> {
    match state.configurations.get_by_id(id).await? {
        Some(configuration) if configuration.application_id == app_id => Ok(()),
        _ => Err(configuration_not_found(id)),
    }
}

fn configuration_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Configuration with ID '{id}' not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_requires_name() {
        assert!(serde_json::from_value::<ConfigurationRequest>(json!({})).is_err());
    }

    #[test]
    fn test_request_rejects_empty_name() {
        let req: ConfigurationRequest = serde_json::from_value(json!({"name": ""})).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_request_optional_fields_default() {
        let req: ConfigurationRequest =
            serde_json::from_value(json!({"name": "cfg-1"})).unwrap();
        assert!(req.comments.is_none());
        assert!(req.config.is_empty());
        assert!(req.validate().is_ok());
    }
}
