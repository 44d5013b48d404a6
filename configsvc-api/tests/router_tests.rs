/// Router tests that need no database
///
/// The state wraps a database manager that is never initialized, so these
/// tests cover everything the HTTP layer decides on its own: liveness
/// endpoints, body and ID validation, and error mapping.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use configsvc_api::app::{build_router, AppState};
use configsvc_api::config::Config;
use configsvc_shared::db::pool::DatabaseManager;
use configsvc_shared::models::COMMENTS_MAX_LENGTH;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const VALID_ID: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";

fn test_app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgresql://localhost/unused".to_string()),
        _ => None,
    })
    .expect("Test configuration");

    let db = Arc::new(DatabaseManager::new(config.database.clone()));
    build_router(AppState::new(db, config))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root() {
    let (status, body) = send(get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Config Service API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_malformed_application_id_is_bad_request() {
    let (status, body) = send(get("/api/v1/applications/not-an-id")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid application ID format"));
}

#[tokio::test]
async fn test_create_application_validates_body() {
    let (status, body) = send(with_json(
        "POST",
        "/api/v1/applications",
        json!({"name": "", "comments": "x".repeat(COMMENTS_MAX_LENGTH + 1)}),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["comments", "name"]);
}

#[tokio::test]
async fn test_create_application_rejects_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/applications")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_bulk_delete_requires_ids() {
    let (status, body) = send(with_json("DELETE", "/api/v1/applications", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "ids");

    let (status, _) = send(with_json(
        "DELETE",
        "/api/v1/applications",
        json!({"ids": []}),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(with_json(
        "DELETE",
        "/api/v1/applications",
        json!({"ids": [VALID_ID, "bad"]}),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_configuration_routes_validate_ids() {
    let (status, _) = send(get(&format!(
        "/api/v1/applications/{VALID_ID}/configurations/bad"
    )))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(with_json(
        "POST",
        "/api/v1/applications/bad/configurations",
        json!({"name": "cfg-1"}),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_unavailable_is_service_unavailable() {
    let (status, body) = send(get(&format!("/api/v1/applications/{VALID_ID}"))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = send(get("/api/v2/applications")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
