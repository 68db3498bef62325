use std::sync::Arc;
use std::time::Duration;

use autodoc_server::store::{ExternalStore, HttpStore};
use autodoc_server::web::{AppState, create_app_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt;

/// Builds the full application against a mocked external store.
pub fn create_test_router(server: &MockServer) -> Router {
    let store: Arc<dyn ExternalStore> =
        Arc::new(HttpStore::new(server.base_url(), Duration::from_secs(2)).unwrap());
    create_app_router(AppState::new(store, None))
}

/// Serves a small set of reference collections.
pub async fn mock_references(server: &MockServer) {
    let collections = [
        ("/cars", json!([{"id": 1, "name": "Golf"}])),
        ("/colors", json!([{"id": 1, "name": "Black"}])),
        (
            "/works",
            json!([{"id": 10, "name": "Oil change"}, {"id": 11, "name": "Polish"}]),
        ),
        (
            "/persons",
            json!([
                {"id": 1, "full_name": "Anna Ivanova"},
                {"id": 2, "full_name": "Boris Petrov"},
                {"id": 3, "full_name": "Vera Sidorova", "is_active": false}
            ]),
        ),
        ("/roles", json!([{"id": 1, "name": "Mechanic"}])),
    ];
    for (path, body) in collections {
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(body);
            })
            .await;
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Sends one request and returns the status with the body as text.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Like [`send`], parsing the body as JSON.
pub async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_str(&body).unwrap())
}
