/// Application endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/applications` - Create application
/// - `GET /api/v1/applications` - List applications, ordered by name
/// - `GET /api/v1/applications/:id` - Get application with configuration IDs
/// - `PUT /api/v1/applications/:id` - Replace application fields
/// - `DELETE /api/v1/applications/:id` - Delete application
/// - `DELETE /api/v1/applications` - Bulk delete by `{"ids": [...]}`

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
use configsvc_shared::models::application::{
    Application, ApplicationWithConfigs, CreateApplication, UpdateApplication,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Create or replace application request
#[derive(Debug, Deserialize, Validate)]
pub struct ApplicationRequest {
    /// Unique application name
    #[validate(length(min = 1, max = 256, message = "Name must be 1-256 characters"))]
    pub name: String,

    /// Free-form comments
    #[validate(length(max = 1024, message = "Comments must be at most 1024 characters"))]
    pub comments: Option<String>,
}

/// Create application
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Name already taken
/// - `500 Internal Server Error`: Server error
pub async fn create_application(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ApplicationRequest>,
) -> ApiResult<(StatusCode, Json<Application>)> {
    let application = state
        .applications
        .create(CreateApplication {
            name: req.name,
            comments: req.comments,
        })
        .await?;

    info!(application_id = %application.id, name = %application.name, "Application created");

    Ok((StatusCode::CREATED, Json(application)))
}

/// List applications
pub async fn list_applications(State(state): State<AppState>) -> ApiResult<Json<Vec<Application>>> {
    Ok(Json(state.applications.get_all().await?))
}

/// Get application with the IDs of its configurations
///
/// # Errors
///
/// - `400 Bad Request`: Malformed ID
/// - `404 Not Found`: No such application
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApplicationWithConfigs>> {
    state
        .applications
        .get_by_id_with_configs(&id)
        .await?
        .map(Json)
        .ok_or_else(|| application_not_found(&id))
}

/// Replace application fields
///
/// # Errors
///
/// - `400 Bad Request`: Malformed ID or validation failed
/// - `404 Not Found`: No such application
/// - `409 Conflict`: Name already taken
pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ApplicationRequest>,
) -> ApiResult<Json<Application>> {
    state
        .applications
        .update(
            &id,
            UpdateApplication {
                name: req.name,
                comments: req.comments,
            },
        )
        .await?
        .map(Json)
        .ok_or_else(|| application_not_found(&id))
}

/// Delete application
///
/// Its configurations are removed with it.
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.applications.delete(&id).await? {
        return Err(application_not_found(&id));
    }

    info!(application_id = %id, "Application deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk delete applications
///
/// # Errors
///
/// - `400 Bad Request`: Missing or empty `ids`, or a malformed ID
/// - `404 Not Found`: None of the IDs matched
pub async fn delete_applications(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<BulkDeleteRequest>,
) -> ApiResult<StatusCode> {
    let deleted = state.applications.delete_many(&req.ids).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("No applications found to delete".to_string()));
    }

    info!(requested = req.ids.len(), deleted, "Applications deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn application_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Application with ID '{id}' not found"))
}
