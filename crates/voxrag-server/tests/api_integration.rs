//! End-to-end tests driving the axum router directly, without binding a
//! real socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use voxrag_core::{Engine, EngineConfig};
use voxrag_server::{router, AppState};

fn test_app(dim: usize) -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        data_dir: dir.path().to_string_lossy().into_owned(),
        dim,
        ..EngineConfig::default()
    };
    let engine = Engine::open(config).unwrap();
    let state = Arc::new(AppState { engine });
    (router(state), dir)
}

async fn send(app: &axum::Router, method: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, parsed)
}

async fn get(app: &axum::Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: Value = serde_json::from_slice(&bytes).unwrap();
    (status, parsed)
}

#[tokio::test]
async fn empty_retrieve_returns_no_chunks() {
    let (app, _dir) = test_app(4);
    let (status, body) = send(
        &app,
        "POST",
        "/retrieve",
        json!({ "query": [1.0, 0.0, 0.0, 0.0] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["chunks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn ingest_then_retrieve_round_trips() {
    let (app, _dir) = test_app(4);

    let (status, body) = send(
        &app,
        "POST",
        "/ingest",
        json!({
            "document": {
                "id": "doc-A",
                "source": "file",
                "timestamp": 0,
                "metadata": {}
            },
            "chunks": [{
                "doc_id": "doc-A",
                "vector": [1.0, 0.0, 0.0, 0.0],
                "content": "hello world",
                "token_count": 10
            }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doc_id"], "doc-A");

    let (status, body) = send(
        &app,
        "POST",
        "/retrieve",
        json!({ "query": [1.0, 0.0, 0.0, 0.0] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let chunks = body["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0]["chunk"]["doc_id"], "doc-A");
}

#[tokio::test]
async fn namespace_filter_isolates_documents() {
    let (app, _dir) = test_app(4);

    for (doc_id, namespace) in [("doc-A", "team-a"), ("doc-B", "team-b")] {
        let (status, _) = send(
            &app,
            "POST",
            "/ingest",
            json!({
                "namespace": namespace,
                "document": { "id": doc_id, "source": "file", "timestamp": 0, "metadata": {} },
                "chunks": [{
                    "doc_id": doc_id,
                    "vector": [1.0, 0.0, 0.0, 0.0],
                    "content": "content",
                    "token_count": 5
                }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        "POST",
        "/retrieve",
        json!({ "query": [1.0, 0.0, 0.0, 0.0], "namespace": "team-a" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let chunks = body["chunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0]["chunk"]["doc_id"], "doc-A");
}

#[tokio::test]
async fn retrieve_rejects_dimension_mismatch() {
    let (app, _dir) = test_app(4);
    let (status, body) = send(&app, "POST", "/retrieve", json!({ "query": [1.0, 0.0] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VOX-001");
}

#[tokio::test]
async fn ingest_message_validates_required_fields() {
    let (app, _dir) = test_app(4);
    let (status, body) = send(
        &app,
        "POST",
        "/ingest_message",
        json!({
            "namespace": "",
            "conversation_id": "c1",
            "role": "user",
            "content": "hi",
            "vector": [1.0, 0.0, 0.0, 0.0],
            "token_count": 1
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VOX-009");
}

#[tokio::test]
async fn reset_clears_index_but_not_persisted_vectors() {
    let (app, _dir) = test_app(4);
    send(
        &app,
        "POST",
        "/ingest",
        json!({
            "document": { "id": "doc-A", "source": "file", "timestamp": 0, "metadata": {} },
            "chunks": [{
                "doc_id": "doc-A",
                "vector": [1.0, 0.0, 0.0, 0.0],
                "content": "hello",
                "token_count": 10
            }]
        }),
    )
    .await;

    let (status, body) = send(&app, "POST", "/reset", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reset_ok");

    let (_, stats) = get(&app, "/stats").await;
    assert_eq!(stats["vec_count"], 1);

    let (_, body) = send(
        &app,
        "POST",
        "/retrieve",
        json!({ "query": [1.0, 0.0, 0.0, 0.0] }),
    )
    .await;
    assert!(body["chunks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_body_is_reported_as_vox_000() {
    let (app, _dir) = test_app(4);
    let request = Request::builder()
        .method("POST")
        .uri("/retrieve")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "VOX-000");
}

#[tokio::test]
async fn unmatched_route_is_reported_as_vox_000() {
    let (app, _dir) = test_app(4);
    let (status, body) = get(&app, "/no-such-route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "VOX-000");
}

#[tokio::test]
async fn health_and_service_descriptor_respond() {
    let (app, _dir) = test_app(4);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "voxrag");
}
