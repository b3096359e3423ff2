mod helpers;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(tmp: &TempDir) -> Router {
    let (service, _db) = helpers::test_service(tmp);
    cocoon::api::router(service)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_raw(app, method, uri, body.map(|json| json.to_string())).await
}

async fn call_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(text) => builder
            .header("content-type", "application/json")
            .body(Body::from(text))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_version() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn note_lifecycle_over_http() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let (status, saved) = call(
        &app,
        Method::PUT,
        "/users/alice/notes/Ideas/bread.md",
        Some(json!({"content": "Sourdough timelapse", "metadata": {"type": "idea"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["path"], "Ideas/bread.md");
    assert_eq!(saved["mirrored"], true);
    assert_eq!(saved["chunks"], 1);

    let (status, note) = call(&app, Method::GET, "/users/alice/notes/Ideas/bread.md", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["content"], saved["content"]);

    let (status, list) = call(&app, Method::GET, "/users/alice/notes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["notes"][0]["path"], "Ideas/bread.md");

    let (status, _) = call(&app, Method::DELETE, "/users/alice/notes/Ideas/bread.md", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, err) = call(&app, Method::GET, "/users/alice/notes/Ideas/bread.md", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error_code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn search_and_ask_return_sources() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);
    call(
        &app,
        Method::PUT,
        "/users/alice/notes/plan.md",
        Some(json!({"content": "publish cooking videos every tuesday"})),
    )
    .await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/alice/search",
        Some(json!({"query": "cooking videos", "top_k": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hits"][0]["path"], "plan.md");

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/alice/ask",
        Some(json!({"question": "when do I publish videos?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], Value::Null);
    assert_eq!(body["sources"][0]["path"], "plan.md");
    assert!(body["context"].as_str().unwrap().contains("tuesday"));
}

#[tokio::test]
async fn bad_input_maps_to_400() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/alice/ask",
        Some(json!({"question": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_INPUT");

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/alice/search",
        Some(json!({"query": "x", "top_k": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_INPUT");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/users/alice/notes/a/../../b.md",
        Some(json!({"content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_PATH");

    let (status, body) = call(&app, Method::GET, "/users/bad.user/notes", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_USER");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let (status, body) = call(&app, Method::PUT, "/users/alice/notes/a.md", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_INPUT");
    assert!(body["error"].as_str().unwrap().contains("content"));

    let (status, body) = call_raw(
        &app,
        Method::PUT,
        "/users/alice/notes/a.md",
        Some("not json".into()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_INPUT");

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/alice/search",
        Some(json!({"query": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_INPUT");

    let (status, body) = call(&app, Method::POST, "/users/alice/ask", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_INPUT");

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/alice/profile",
        Some(json!(["not", "an", "object"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALID_INVALID_INPUT");

    let (status, _) = call(&app, Method::GET, "/users/alice/notes/a.md", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_writes_starter_notes() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);

    let (status, body) = call(
        &app,
        Method::POST,
        "/users/alice/profile",
        Some(json!({
            "experienceLevel": "intermediate",
            "niche": "urban gardening",
            "platforms": ["Instagram"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completion"], 25);
    assert_eq!(body["notes"].as_array().unwrap().len(), 8);

    let (status, dash) = call(&app, Method::GET, "/users/alice/notes/Dashboard.md", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dash["content"].as_str().unwrap().contains("type: dashboard"));

    let (status, strategy) = call(
        &app,
        Method::GET,
        "/users/alice/notes/Content_Strategy/master_strategy.md",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let strategy = strategy["content"].as_str().unwrap();
    assert!(strategy.contains("### Instagram"));
    assert!(strategy.contains("Focus on growth before monetizing"));

    let (_, hits) = call(
        &app,
        Method::POST,
        "/users/alice/search",
        Some(json!({"query": "urban gardening"})),
    )
    .await;
    assert!(!hits["hits"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn reindex_route_reports_counts() {
    let tmp = TempDir::new().unwrap();
    let app = app(&tmp);
    call(
        &app,
        Method::PUT,
        "/users/alice/notes/a.md",
        Some(json!({"content": "one"})),
    )
    .await;

    let (status, body) = call(&app, Method::POST, "/users/alice/reindex", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"notes": 1, "chunks": 1}));
}
