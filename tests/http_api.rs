// End-to-end tests for the HTTP surface, backed by a real SQLite file

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use vocabdb::http::HttpServer;
use vocabdb::{QueryExecutor, QueryGate, ServerConfig};

fn vocabulary_store() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("GRE_3333.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE Description (id INTEGER PRIMARY KEY, term TEXT);
         INSERT INTO Description VALUES (1, 'abc');
         CREATE TABLE Vocabulary (id INTEGER PRIMARY KEY, word TEXT, frequency INTEGER);
         INSERT INTO Vocabulary VALUES (1, 'abate', 12);
         CREATE TABLE Meaning (id INTEGER PRIMARY KEY, vocabulary_id INTEGER, meaning TEXT);",
    )
    .unwrap();
    (dir, path)
}

fn router(path: &PathBuf) -> Router {
    let config = ServerConfig {
        db_path: path.clone(),
        ..ServerConfig::default()
    };
    let executor = QueryExecutor::open_with(&config.db_path, config.open_options()).unwrap();
    HttpServer::new(config, Arc::new(QueryGate::new(executor))).router()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn execute_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/db/execute")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_hello() {
    let (_dir, path) = vocabulary_store();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, body) = send(router(&path), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Hello, World!"}));
}

#[tokio::test]
async fn test_execute_select() {
    let (_dir, path) = vocabulary_store();

    let (status, body) = send(
        router(&path),
        execute_request(json!({"query": "SELECT * FROM Description"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": 1, "term": "abc"}]));
}

#[tokio::test]
async fn test_execute_single_row() {
    let (_dir, path) = vocabulary_store();

    let (status, body) = send(
        router(&path),
        execute_request(json!({"query": "SELECT word FROM Vocabulary", "single": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"word": "abate"}));
}

#[tokio::test]
async fn test_execute_rejects_writes() {
    let (_dir, path) = vocabulary_store();

    let (status, body) = send(
        router(&path),
        execute_request(json!({"query": "DROP TABLE Description"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "only SELECT and PRAGMA queries are supported", "code": 400})
    );
}

#[tokio::test]
async fn test_execute_reports_store_errors() {
    let (_dir, path) = vocabulary_store();

    let (status, body) = send(
        router(&path),
        execute_request(json!({"query": "SELECT * FROM Missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("store error"));
}

#[tokio::test]
async fn test_format_describes_configured_tables() {
    let (_dir, path) = vocabulary_store();
    let request = Request::builder().uri("/db/format").body(Body::empty()).unwrap();

    let (status, body) = send(router(&path), request).await;
    assert_eq!(status, StatusCode::OK);

    let tables = body.as_array().unwrap();
    assert_eq!(tables.len(), 2);

    let vocabulary = tables[0].as_array().unwrap();
    assert_eq!(vocabulary.len(), 3);
    assert_eq!(vocabulary[1]["name"], json!("word"));

    let meaning = tables[1].as_array().unwrap();
    assert_eq!(meaning.len(), 3);
    assert_eq!(meaning[2]["name"], json!("meaning"));
}
