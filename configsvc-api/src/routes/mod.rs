/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Root and health check endpoints
/// - `applications`: Application CRUD endpoints
/// - `configurations`: Configuration CRUD endpoints, nested under an application

pub mod applications;
pub mod configurations;
pub mod health;

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use validator::Validate;

/// JSON body that has been deserialized and validated
///
/// Malformed bodies and failed field rules both surface as 400 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Bulk delete request body
#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    /// Identifiers to delete; must not be empty
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one ID is required"))]
    pub ids: Vec<String>,
}
