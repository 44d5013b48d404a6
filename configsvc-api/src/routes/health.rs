/// Liveness endpoints
///
/// Neither endpoint touches the database, so they answer even while the
/// store is unreachable.
///
/// # Endpoints
///
/// ```text
/// GET /        -> {"message": "Config Service API", "version": "0.1.0"}
/// GET /health  -> {"status": "healthy"}
/// ```

use axum::Json;
use serde::{Deserialize, Serialize};

/// Root endpoint response
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    /// Service banner
    pub message: String,

    /// Application version
    pub version: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
}

/// Root handler
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Config Service API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check handler
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
