// Trigger API routes for the settlement pipeline

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::application::pipeline::{CloseOutcome, PipelineLauncher, RunStatusView};
use crate::domain::errors::PipelineError;

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    pub launcher: Arc<PipelineLauncher>,
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/campaigns/{id}/close", post(close_campaign))
        .route("/api/runs/{id}/status", get(run_status))
        .route("/api/runs/{id}/stop", post(stop_run))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Close a campaign and launch its settlement run
async fn close_campaign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CloseOutcome>, ApiError> {
    let outcome = state.launcher.close_campaign(id).await?;
    Ok(Json(outcome))
}

/// Status of a settlement run
async fn run_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RunStatusView>, ApiError> {
    let status = state.launcher.run_status(id).await?;
    Ok(Json(status))
}

/// Request a settlement run to stop between chunks
async fn stop_run(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let accepted = state.launcher.request_stop(id).await?;
    Ok(Json(json!({
        "run_id": id,
        "stop_requested": accepted
    })))
}

/// Maps pipeline errors onto HTTP responses
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PipelineError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            PipelineError::Validation(msg) => (StatusCode::CONFLICT, msg.clone()),
            PipelineError::DbError(_)
            | PipelineError::ConfigError(_)
            | PipelineError::Engine(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
