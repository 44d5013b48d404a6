/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use configsvc_api::{app::AppState, config::Config};
/// use configsvc_shared::db::pool::DatabaseManager;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let db = Arc::new(DatabaseManager::new(config.database.clone()));
/// db.initialize().await?;
/// let state = AppState::new(db, config);
/// let app = configsvc_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use configsvc_shared::db::pool::DatabaseManager;
use configsvc_shared::repositories::application::ApplicationRepository;
use configsvc_shared::repositories::configuration::ConfigurationRepository;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Both repositories share one database manager.
#[derive(Clone)]
pub struct AppState {
    /// Application repository
    pub applications: ApplicationRepository,

    /// Configuration repository
    pub configurations: ConfigurationRepository,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state around an existing database manager
    pub fn new(db: Arc<DatabaseManager>, config: Config) -> Self {
        Self {
            applications: ApplicationRepository::new(Arc::clone(&db)),
            configurations: ConfigurationRepository::new(db),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /                                   # Service banner
/// ├── GET /health                             # Liveness probe
/// └── /api/v1/applications
///     ├── GET, POST, DELETE /                 # List, create, bulk delete
///     ├── GET, PUT, DELETE /:app_id           # Read, replace, delete
///     └── /:app_id/configurations
///         ├── GET, POST, DELETE /             # List, create, bulk delete
///         └── GET, PUT, DELETE /:id           # Read, replace, delete
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{applications, configurations, health};

    let configuration_routes = Router::new()
        .route(
            "/",
            get(configurations::list_configurations)
                .post(configurations::create_configuration)
                .delete(configurations::delete_configurations),
        )
        .route(
            "/:id",
            get(configurations::get_configuration)
                .put(configurations::update_configuration)
                .delete(configurations::delete_configuration),
        );

    let application_routes = Router::new()
        .route(
            "/",
            get(applications::list_applications)
                .post(applications::create_application)
                .delete(applications::delete_applications),
        )
        .route(
            "/:app_id",
            get(applications::get_application)
                .put(applications::update_application)
                .delete(applications::delete_application),
        )
        .nest("/:app_id/configurations", configuration_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .nest("/api/v1/applications", application_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins; `*` allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use configsvc_shared::repositories::RepositoryError;

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgresql://localhost/unused".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_state_shares_one_manager_between_repositories() {
        let config = test_config();
        let db = Arc::new(DatabaseManager::new(config.database.clone()));
        let state = AppState::new(Arc::clone(&db), config);

        // Ours plus one per repository
        assert_eq!(Arc::strong_count(&db), 3);

        let cloned = state.clone();
        assert_eq!(Arc::strong_count(&db), 5);
        drop(cloned);

        assert!(matches!(
            state.applications.get_all().await,
            Err(RepositoryError::Uninitialized)
        ));
        assert!(matches!(
            state.configurations.get_all().await,
            Err(RepositoryError::Uninitialized)
        ));
    }
}
