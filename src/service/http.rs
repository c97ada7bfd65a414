//! HTTP surface
//!
//! Two routes: a health probe and a synchronous transcription endpoint that
//! runs the same executor the relay uses. The executor blocks, so the
//! handler moves it onto the blocking pool for the duration of the job.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use crate::job::{JobDescriptor, JobExecutor, JobResult};

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<JobExecutor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transcribe", post(transcribe))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "UP" }))
}

async fn transcribe(
    State(state): State<AppState>,
    Json(job): Json<JobDescriptor>,
) -> Result<(StatusCode, Json<JobResult>), ApiError> {
    info!("Transcription requested over HTTP for job {}", job.job_id);

    let executor = state.executor.clone();
    let result = tokio::task::spawn_blocking(move || executor.execute(&job))
        .await
        .map_err(|e| ApiError::internal(format!("transcription task panicked: {e}")))?
        .map_err(|e| {
            error!("Transcription failed: {}", e);
            ApiError::internal(e.to_string())
        })?;

    Ok((StatusCode::ACCEPTED, Json(result)))
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
