//! In-process stand-ins for the recognition service.

use axum::{
    Json, Router,
    body::Bytes,
    http::StatusCode,
    routing::{head, post},
};
use serde_json::Value;
use std::{
    io::Write,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tempfile::NamedTempFile;

pub const RECOGNIZE_PATH: &str = "/recognize";

#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}{RECOGNIZE_PATH}")
}

/// POST-only endpoint: probes get 405, which counts as healthy.
pub async fn serve_json(status: StatusCode, body: Value) -> (String, Hits) {
    let hits = Hits::default();
    let counter = hits.clone();
    let router = Router::new().route(
        RECOGNIZE_PATH,
        post(move |upload: Bytes| {
            let body = body.clone();
            let counter = counter.clone();
            async move {
                if String::from_utf8_lossy(&upload).contains("name=\"image\"") {
                    counter.bump();
                }
                (status, Json(body))
            }
        }),
    );
    (spawn(router).await, hits)
}

pub async fn serve_labels(field: &str, labels: &[&str]) -> (String, Hits) {
    let mut payload = serde_json::Map::new();
    payload.insert(field.to_string(), serde_json::json!(labels));
    serve_json(StatusCode::OK, Value::Object(payload)).await
}

pub async fn serve_text(status: StatusCode, body: &'static str) -> String {
    let router = Router::new().route(RECOGNIZE_PATH, post(move || async move { (status, body) }));
    spawn(router).await
}

pub async fn serve_unhealthy() -> (String, Hits) {
    let hits = Hits::default();
    let counter = hits.clone();
    let router = Router::new().route(
        RECOGNIZE_PATH,
        head(|| async { StatusCode::SERVICE_UNAVAILABLE }).post(move || {
            let counter = counter.clone();
            async move {
                counter.bump();
                Json(serde_json::json!({ "tags": ["tomato"] }))
            }
        }),
    );
    (spawn(router).await, hits)
}

pub async fn serve_slow(delay: Duration) -> String {
    let router = Router::new().route(
        RECOGNIZE_PATH,
        post(move || async move {
            tokio::time::sleep(delay).await;
            Json(serde_json::json!({ "tags": ["tomato"] }))
        }),
    );
    spawn(router).await
}

/// Nothing listens on port 1 on loopback.
pub fn unreachable_endpoint() -> String {
    format!("http://127.0.0.1:1{RECOGNIZE_PATH}")
}

pub fn image_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp image");
    file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'])
        .expect("write image");
    file
}
