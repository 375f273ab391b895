use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use quill_core::builtin;
use quill_core::catalog::Catalog;
use quill_engine::backend::ScriptedBackend;
use quill_engine::render::BuiltinTemplates;
use quill_engine::{BatchAggregator, Dispatcher, ModelConfig, Worker, WorkerPool};
use quill_store::MemoryStore;

use quill_api::config::ServerConfig;
use quill_api::router::build_app_router;
use quill_api::state::AppState;

/// A fully wired test application with its seams exposed.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub backend: Arc<ScriptedBackend>,
    // Held so the worker pool keeps running for the test's lifetime.
    _cancel: CancellationToken,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        job_ttl_secs: 3600,
        sweep_interval_secs: 60,
        worker_concurrency: 2,
        queue_capacity: 64,
        gateway_url: "http://localhost:8800".to_string(),
        models: ModelConfig::default(),
    }
}

/// Build the full application router with all middleware layers, backed
/// by an in-memory store and a scripted generation backend.
///
/// This mirrors the wiring in `main.rs` so integration tests exercise the
/// same middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery) that production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();

    let catalog = Arc::new(Catalog::build(&builtin::definitions()));
    let store = Arc::new(MemoryStore::new(Duration::from_secs(config.job_ttl_secs)));
    let backend = Arc::new(ScriptedBackend::new());
    let worker = Arc::new(Worker::new(
        store.clone(),
        Arc::new(BuiltinTemplates),
        backend.clone(),
    ));

    let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
    let cancel = CancellationToken::new();
    WorkerPool::spawn(
        config.worker_concurrency,
        worker.clone(),
        queue_rx,
        cancel.clone(),
    );

    let aggregator = Arc::new(BatchAggregator::new(store.clone(), store.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        catalog.clone(),
        store.clone(),
        aggregator.clone(),
        queue_tx,
        worker,
        config.models.clone(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        catalog,
        jobs: store.clone(),
        dispatcher,
        aggregator,
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        backend,
        _cancel: cancel,
    }
}

/// Issue a GET request against the app.
pub async fn get(app: &Router, path: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: &Router, path: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll a job until it reaches a terminal status, failing after ~1s.
pub async fn poll_until_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let response = get(app, &format!("/api/v1/jobs/{job_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let status = json["data"]["status"].as_str().unwrap().to_string();
        if status == "completed" || status == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}

/// A minimal entry target snapshot with one configured field.
pub fn entry_target(id: &str, field: &str, actions: &[&str], body: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": "entry",
        "id": id,
        "blueprint": {
            "fields": {
                field: { "category": "text", "actions": actions }
            }
        },
        "fields": { "body": body }
    })
}

/// An asset target snapshot with one configured field and a MIME type.
pub fn asset_target(id: &str, field: &str, actions: &[&str], mime: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": "asset",
        "id": id,
        "blueprint": {
            "fields": {
                field: { "category": "asset", "actions": actions }
            }
        },
        "fields": {},
        "asset": {
            "mime_type": mime,
            "url": format!("https://cdn.example.test/{id}"),
            "extension": null
        }
    })
}
