//! HTTP surface of the inference service

use crate::error::ScoringError;
use crate::service::InferenceService;
use crate::types::{ErrorResponse, PredictResponse};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::services::ServeFile;
use tracing::info_span;
use uuid::Uuid;

pub const WELCOME: &str = "Welcome to the prediction API!";

/// Shared application state
pub struct AppState {
    pub service: InferenceService,
    pub started_at: DateTime<Utc>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(service: InferenceService, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            started_at: Utc::now(),
            static_dir: static_dir.into(),
        }
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
    feature_count: usize,
    started_at: DateTime<Utc>,
    requests: u64,
}

impl IntoResponse for ScoringError {
    fn into_response(self) -> Response {
        let status = match self {
            ScoringError::Validation(_) => StatusCode::BAD_REQUEST,
            ScoringError::Inference(_) | ScoringError::Startup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Build the service router
pub fn router(state: SharedState) -> Router {
    let favicon = ServeFile::new(state.static_dir.join("favicon.ico"));

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        // `features` has no length cap
        .route("/predict", post(predict).layer(DefaultBodyLimit::disable()))
        .route_service("/favicon.ico", favicon)
        .with_state(state)
}

async fn home() -> &'static str {
    WELCOME
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.service.model_name().to_string(),
        feature_count: state.service.feature_count(),
        started_at: state.started_at,
        requests: state
            .service
            .metrics()
            .requests_total
            .load(Ordering::Relaxed),
    })
}

async fn predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ScoringError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", request_id = %request_id);

    span.in_scope(|| state.service.handle(&body)).map(Json)
}
