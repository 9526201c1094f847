//! HTTP route tests driven through the router with `oneshot`

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use quarry_config::{IndexerConfig, QuarryConfig, DEFAULT_MODEL};
use quarry_core::test_support::{GraphBuilder, InMemorySource, TEST_ENDPOINT};
use quarry_core::vocab::DCTERMS;
use quarry_core::{Fields, PipelineContext, Severity, Stage, StageError};
use quarry_pipeline::{Assembler, StageRegistry};
use quarry_web::routes::WARNINGS_HEADER;
use quarry_web::{router, AppState, PROBLEM_JSON};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn source() -> InMemorySource {
    let source = InMemorySource::new();
    let thing = GraphBuilder::new(&source, "/thing")
        .literal(&format!("{DCTERMS}title"), "Just a thing")
        .build();
    source.with_graph(thing)
}

fn app_with(config: &QuarryConfig, registry: StageRegistry, source: InMemorySource) -> Router {
    let assembler = Assembler::with_registry(config, registry, Arc::new(source)).expect("valid configuration");
    router(AppState::new(Arc::new(assembler)))
}

fn app() -> Router {
    app_with(&QuarryConfig::default(), StageRegistry::builtin(), source())
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_u64());
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_doc_returns_document() {
    let (status, headers, body) = get(app(), "/doc?uri=/thing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json;charset=utf-8");
    assert_eq!(headers[WARNINGS_HEADER], "0");
    assert_eq!(body["id"], format!("{TEST_ENDPOINT}/thing"));
    assert_eq!(body["resource__title__txt"], "Just a thing");
}

#[tokio::test]
async fn test_doc_accepts_full_uri() {
    let uri = format!("/doc?uri={}", urlencode(&format!("{TEST_ENDPOINT}/thing")));
    let (status, _, body) = get(app(), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], format!("{TEST_ENDPOINT}/thing"));
}

#[tokio::test]
async fn test_add_command() {
    let (status, _, body) = get(app(), "/doc?uri=/thing&command=add").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["add"]["doc"]["resource__title__txt"], "Just a thing");
}

#[tokio::test]
async fn test_update_command() {
    let (status, _, body) = get(app(), "/doc?uri=/thing&command=update").await;

    assert_eq!(status, StatusCode::OK);
    let updates = body.as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["id"], format!("{TEST_ENDPOINT}/thing"));
    assert_eq!(updates[0]["resource__title__txt"], json!({"set": "Just a thing"}));
}

#[tokio::test]
async fn test_missing_uri() {
    let (status, headers, body) = get(app(), "/doc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], PROBLEM_JSON);
    assert_eq!(body["status"], 400);
    assert_eq!(body["title"], "No resource requested");
}

#[tokio::test]
async fn test_unknown_command() {
    let (status, _, body) = get(app(), "/doc?uri=/thing&command=delete").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Unknown command");
    assert!(body["details"].as_str().unwrap().contains("delete"));
}

#[tokio::test]
async fn test_unknown_resource() {
    let (status, headers, body) = get(app(), "/doc?uri=/nowhere").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers[header::CONTENT_TYPE], PROBLEM_JSON);
    assert_eq!(body["title"], "Resource is not available");
}

struct Explodes;

#[async_trait]
impl Stage for Explodes {
    fn name(&self) -> &str {
        "explodes"
    }

    fn default_severity(&self) -> Severity {
        Severity::Required
    }

    async fn run(&self, _ctx: &PipelineContext<'_>) -> Result<Fields, StageError> {
        Err(StageError::failed("exploded"))
    }
}

#[tokio::test]
async fn test_required_stage_failure() {
    let config = QuarryConfig {
        indexers: IndexerConfig::from_pairs([(DEFAULT_MODEL, vec!["content_model", "explodes"])]),
        ..Default::default()
    };
    let registry = StageRegistry::builder().with_builtins().register(Explodes).build();
    let (status, _, body) = get(app_with(&config, registry, source()), "/doc?uri=/thing").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["title"], "Indexing failed");
    assert!(body["details"].as_str().unwrap().contains("explodes"));
}

#[tokio::test]
async fn test_timeout() {
    let slow = source().with_delay(Duration::from_millis(500));
    let app = app_with(&QuarryConfig::default(), StageRegistry::builtin(), slow);
    let (status, _, body) = get(app, "/doc?uri=/thing&timeout_ms=20").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["title"], "Indexing timed out");
}

fn urlencode(value: &str) -> String {
    value.replace(':', "%3A").replace('/', "%2F")
}
