// src/handlers/video.rs
use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::jobs::VideoResult;
use crate::models::video::GenerateVideoBody;
use crate::AppState;

pub fn video_routes() -> Router {
    Router::new().route("/api/v1/generate-video", post(generate_video))
}

/// POST /api/v1/generate-video - blocks until the provider finishes, fails, or times out
pub async fn generate_video(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<GenerateVideoBody>, JsonRejection>,
) -> ApiResult<Json<VideoResult>> {
    let Json(body) = body.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let (prompt, options) = body.into_job()?;

    tracing::info!(
        "🎥 Video generation requested (model={}, aspect_ratio={})",
        options.model,
        options.aspect_ratio
    );

    let result = state
        .video_jobs
        .run(&prompt, options)
        .await
        .map_err(|e| ApiError::upstream("Failed to generate video", e))?;

    Ok(Json(result))
}
