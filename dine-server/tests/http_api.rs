//! HTTP surface: routes, status mapping, and the admin guard

use axum::body::Body;
use axum::Router;
use dine_server::{api, Config, ErrorCode, ServerState};
use http::{header, Method, Request, StatusCode};
use tower::util::ServiceExt;

fn scratch_app(admin_token: Option<&str>) -> (Router, ServerState, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let mut config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0, 0);
    config.admin_token = admin_token.map(String::from);
    let state = ServerState::initialize(&config).expect("initialize state");
    (api::build_app(state.clone()), state, dir)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn json_request(method: Method, path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health_and_listings() {
    let (app, _state, _dir) = scratch_app(None);

    let response = app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app.clone().oneshot(get("/api/tables")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tables = body_json(response).await;
    assert_eq!(tables.as_array().unwrap().len(), 5);

    let response = app.oneshot(get("/api/menu")).await.unwrap();
    let menu = body_json(response).await;
    assert_eq!(menu.as_array().unwrap().len(), 4);
    assert_eq!(menu[0]["name"], "Margherita Pizza");
}

#[tokio::test]
async fn test_table_status_update_and_errors() {
    let (app, _state, _dir) = scratch_app(None);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/tables/1",
            serde_json::json!({"status": "occupied"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let table = body_json(response).await;
    assert_eq!(table["status"], "occupied");
    assert_eq!(table["version"], 1);

    // Unknown status string
    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/tables/1",
            serde_json::json!({"status": "zombied"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], ErrorCode::InvalidStatus.code());

    // Missing table
    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/api/tables/99",
            serde_json::json!({"status": "billed"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_flow_over_http() {
    let (app, _state, _dir) = scratch_app(None);

    let response = app.clone().oneshot(get("/api/orders/active")).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);

    let response = app.clone().oneshot(get("/api/orders/7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], ErrorCode::OrderNotFound.code());
}

#[tokio::test]
async fn test_stale_version_maps_to_conflict() {
    let (app, _state, _dir) = scratch_app(None);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/tables/2",
            serde_json::json!({"status": "occupied", "expected_version": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/api/tables/2",
            serde_json::json!({"status": "billed", "expected_version": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], ErrorCode::VersionConflict.code());
}

#[tokio::test]
async fn test_admin_guard_on_privileged_routes() {
    let (app, _state, _dir) = scratch_app(Some("sesame"));

    // Reads stay public
    let response = app.clone().oneshot(get("/api/menu")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = serde_json::json!({
        "name": "Garlic Bread",
        "price": "120",
        "category": "Starters",
        "is_veg": true,
    });

    // No token
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/menu", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/menu")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Correct token
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/menu")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer sesame")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let item = body_json(response).await;
    assert_eq!(item["name"], "Garlic Bread");
}
