//! Integration tests for wordup-ingest API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - POST /api/upload success and error bodies
//! - POST /api/upload/raw archiving
//! - GET /api/collection
//! - Upload size limit

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method
use wordup_common::config::DedupPolicy;
use wordup_ingest::archive::RawArchive;
use wordup_ingest::dictionary::StaticShardSource;
use wordup_ingest::merge::MergeStore;
use wordup_ingest::pipeline::IngestPipeline;
use wordup_ingest::store::MemoryContentStore;
use wordup_ingest::{build_router, AppState};

const COLLECTION: &str = "data/wordbook.json";
const BOUNDARY: &str = "wordup-test-boundary";

/// Test helper: app backed by an in-memory store
fn setup_app(store: Arc<MemoryContentStore>, max_upload_bytes: usize) -> axum::Router {
    let shards = Arc::new(
        StaticShardSource::new().with_shard('a', r#"[{"name":"apple","trans":["n. 苹果"]}]"#),
    );
    let merge = MergeStore::new(store.clone(), COLLECTION, DedupPolicy::Name, "Update wordbook");
    let pipeline = IngestPipeline::new(shards, merge);
    let archive = RawArchive::new(store, "upload", "File uploaded via web app");

    build_router(AppState::new(pipeline, archive, max_upload_bytes))
}

/// Test helper: multipart body with one field
fn multipart_request(uri: &str, field: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(Arc::new(MemoryContentStore::new()), 1024);

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "wordup-ingest");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

// =============================================================================
// Upload Endpoint
// =============================================================================

#[tokio::test]
async fn test_upload_word_list() {
    let store = Arc::new(MemoryContentStore::new());
    let app = setup_app(store.clone(), 1024);

    let request = multipart_request("/api/upload", "file", Some("words.txt"), b"apple\nbanana\napple\n");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["format"], "lines");
    assert_eq!(body["received"], 3);
    assert_eq!(body["total"], 2);
    assert_eq!(body["not_found"], 1);
    assert!(body["message"].is_string());

    let stored: Value = serde_json::from_slice(&store.get(COLLECTION).await.unwrap()).unwrap();
    assert_eq!(stored[0]["name"], "apple");
    assert_eq!(stored[1]["name"], "banana");
}

#[tokio::test]
async fn test_upload_unsupported_extension() {
    let store = Arc::new(MemoryContentStore::new());
    let app = setup_app(store.clone(), 1024);

    let request = multipart_request("/api/upload", "file", Some("words.csv"), b"apple");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    assert!(store.commits().await.is_empty());
}

#[tokio::test]
async fn test_upload_malformed_json() {
    let app = setup_app(Arc::new(MemoryContentStore::new()), 1024);

    let request = multipart_request("/api/upload", "file", Some("dict.json"), b"[{\"name\":1}]");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "FORMAT_ERROR");
}

#[tokio::test]
async fn test_upload_schema_violation() {
    let app = setup_app(Arc::new(MemoryContentStore::new()), 1024);

    let request = multipart_request(
        "/api/upload",
        "file",
        Some("dict.json"),
        br#"[{"name":"","trans":["x"]}]"#,
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "SCHEMA_VALIDATION");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = setup_app(Arc::new(MemoryContentStore::new()), 1024);

    let request = multipart_request("/api/upload", "comment", None, b"hello");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_without_file_name() {
    let app = setup_app(Arc::new(MemoryContentStore::new()), 1024);

    let request = multipart_request("/api/upload", "file", None, b"apple");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_large() {
    let store = Arc::new(MemoryContentStore::new());
    let app = setup_app(store.clone(), 16);

    let request = multipart_request("/api/upload", "file", Some("words.txt"), &[b'a'; 64]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(store.commits().await.is_empty());
}

// =============================================================================
// Raw Archive Endpoint
// =============================================================================

#[tokio::test]
async fn test_raw_upload_archives_verbatim() {
    let store = Arc::new(MemoryContentStore::new());
    let app = setup_app(store.clone(), 1024);

    let request = multipart_request("/api/upload/raw", "file", Some("notes.txt"), b"not parsed\n");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["path"], "upload/notes.txt");
    assert_eq!(body["created"], true);

    assert_eq!(store.get("upload/notes.txt").await.unwrap(), b"not parsed\n");
    assert!(store.get(COLLECTION).await.is_none());
}

// =============================================================================
// Collection Endpoint
// =============================================================================

#[tokio::test]
async fn test_collection_before_and_after_upload() {
    let store = Arc::new(MemoryContentStore::new());
    let app = setup_app(store, 1024);

    let response = app.clone().oneshot(get_request("/api/collection")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 0);
    assert!(body["version"].is_null());

    let request = multipart_request(
        "/api/upload",
        "file",
        Some("dict.json"),
        br#"[{"name":"Zeta","trans":["n. z"]}]"#,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/api/collection")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert!(body["version"].is_string());
    assert_eq!(body["entries"][0]["name"], "zeta");
    assert_eq!(body["entries"][0]["trans"][0], "n. z");
}

#[tokio::test]
async fn test_unreadable_collection_is_store_read_error() {
    let store = Arc::new(MemoryContentStore::new());
    store.insert(COLLECTION, "{\"not\":\"an array\"}").await;
    let app = setup_app(store.clone(), 1024);

    let request = multipart_request("/api/upload", "file", Some("w.txt"), b"apple");
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "STORE_READ_ERROR");
    assert_eq!(store.get(COLLECTION).await.unwrap(), b"{\"not\":\"an array\"}");
}
