/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; repository errors convert with
/// `?`, and store failures never leak their driver text to clients.
///
/// # Example
///
/// ```no_run
/// use configsvc_api::error::ApiResult;
/// use configsvc_shared::models::application::Application;
/// use configsvc_shared::repositories::application::ApplicationRepository;
/// use axum::Json;
///
/// async fn handler(repo: ApplicationRepository) -> ApiResult<Json<Vec<Application>>> {
///     Ok(Json(repo.get_all().await?))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use configsvc_shared::repositories::RepositoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400), e.g. a malformed identifier
    BadRequest(String),

    /// Bad request (400) with per-field details
    ValidationError(Vec<ValidationErrorDetail>),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate name
    Conflict(String),

    /// Internal server error (500)
    ///
    /// `message` goes to the client, `detail` only to the log.
    InternalError { message: String, detail: String },

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError { message, .. } => write!(f, "Internal error: {}", message),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::InternalError { message, detail } => {
                // Log internal errors but don't expose details to clients
                tracing::error!(%detail, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    message,
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert repository errors to API errors
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(msg) => ApiError::BadRequest(msg),
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::Conflict(msg) => ApiError::Conflict(msg),
            RepositoryError::Uninitialized => {
                ApiError::ServiceUnavailable("Database is not available".to_string())
            }
            RepositoryError::Storage { context, source } => ApiError::InternalError {
                message: context.to_string(),
                detail: source.to_string(),
            },
        }
    }
}

/// Convert `validator` failures to a 400 with one detail per field error
impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configsvc_shared::db::pool::DbError;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Application not found".to_string());
        assert_eq!(err.to_string(), "Not found: Application not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "name".to_string(),
                message: "Name must be 1-256 characters".to_string(),
            },
            ValidationErrorDetail {
                field: "comments".to_string(),
                message: "Comments must be at most 1024 characters".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_repository_error_status_codes() {
        let cases = [
            (
                RepositoryError::Validation("Invalid application ID format".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepositoryError::NotFound("Application not found".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                RepositoryError::Conflict("Application with name 'a' already exists".to_string()),
                StatusCode::CONFLICT,
            ),
            (RepositoryError::Uninitialized, StatusCode::SERVICE_UNAVAILABLE),
            (
                RepositoryError::Storage {
                    context: "Failed to create application",
                    source: DbError::Closed,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_storage_error_keeps_generic_message() {
        let err = ApiError::from(RepositoryError::Storage {
            context: "Failed to create application",
            source: DbError::Closed,
        });

        match &err {
            ApiError::InternalError { message, detail } => {
                assert_eq!(message, "Failed to create application");
                assert_eq!(detail, "Database pool closed");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.to_string(), "Internal error: Failed to create application");
    }
}
