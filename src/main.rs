mod catalog;
mod classifier;
mod fallback;
mod http;
mod metrics;
mod models;
mod pipeline;
mod scoring;
mod vision;

#[cfg(test)]
mod test_support;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::{ApiError, ClassifyRequest, ClassifyResponse};
use pipeline::{Pipeline, PipelineError, PipelineErrorKind};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "pantry.api", "server crashed: {err:?}");
    }
}

async fn run() -> eyre::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let pipeline = Pipeline::from_env();
    info!(
        target = "pantry.api",
        endpoint = %pipeline.vision.endpoint(),
        catalog_items = catalog::catalog().len(),
        "vision pipeline ready"
    );
    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;
    let app = app(AppState {
        pipeline,
        prometheus_handle,
    });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "pantry.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
    prometheus_handle: PrometheusHandle,
}

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/ingredients/classify", post(classify_ingredients))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit_from_env()))
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
///
/// Reports on this process only; the recognition service is probed per request.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "pantry-vision",
    }))
}

fn body_limit_from_env() -> usize {
    std::env::var("REQUEST_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(64 * 1024)
}

async fn metrics_endpoint(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Ok(secret) = std::env::var("METRICS_KEY") {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus_handle.render(),
    )
        .into_response()
}

/// Classify the ingredients visible in a stored photo.
///
/// - Method: `POST`
/// - Path: `/ingredients/classify`
/// - Body: `ClassifyRequest` (`image_path` of a file already on local storage)
/// - Response: `ClassifyResponse` (ranked ingredients, outcome and per-stage transcript)
///
/// Only an unusable `image_path` produces an error; recognition trouble is absorbed by
/// the pipeline.
async fn classify_ingredients(
    State(state): State<AppState>,
    Json(payload): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    crate::metrics::inc_requests("/ingredients/classify");
    let request_id = Uuid::new_v4().simple().to_string();
    let path = pipeline::resolve_image_path(&payload.image_path).await?;
    info!(
        target = "pantry.api",
        request_id = %request_id,
        image = %path.display(),
        "classification requested",
    );

    let classification = state.pipeline.classify_detailed(&path).await;
    Ok(Json(ClassifyResponse {
        request_id,
        outcome: classification.outcome.as_str().to_string(),
        ingredients: classification.ingredients,
        stages: classification.stages,
    }))
}

#[derive(Debug)]
enum AppError {
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Pipeline(err) => {
                let status = match err.kind() {
                    PipelineErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    PipelineErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let payload = ApiError {
                    error: err.stage().to_string(),
                    detail: Some(err.detail().to_string()),
                };
                (status, Json(payload)).into_response()
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
