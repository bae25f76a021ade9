// src/handlers/status.rs
use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

/// GET /api/status - liveness plus which upstreams this instance talks to
pub async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "gemini": {
                "model": state.gemini_client.model(),
            },
            "veo3": {
                "base_url": state.veo3_client.base_url(),
                "poll_interval_secs": config.video_job.poll_interval.as_secs(),
                "max_poll_attempts": config.video_job.max_poll_attempts,
            }
        },
        "artifacts": {
            "directory": state.artifact_store.root().display().to_string(),
            "cleanup_interval_secs": config.cleanup_interval.as_secs(),
        },
        "endpoints": {
            "process": "/api/v1/process",
            "generate_video": "/api/v1/generate-video",
            "credits": "/api/v1/credits",
            "status": "/api/status"
        }
    }))
}
