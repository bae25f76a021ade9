// lib.rs - gateway library: provider clients, job orchestration and the HTTP surface
pub mod artifact_store;
pub mod clock;
pub mod config;
pub mod error;
pub mod gemini_client;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod veo_client;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use artifact_store::ArtifactStore;
use config::AppConfig;
use gemini_client::GeminiClient;
use jobs::VideoJobOrchestrator;
use veo_client::Veo3Client;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub config: AppConfig,
    pub artifact_store: ArtifactStore,
    pub gemini_client: GeminiClient,
    pub veo3_client: Veo3Client,
    pub video_jobs: VideoJobOrchestrator,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Self {
        let artifact_store = ArtifactStore::new(config.uploads_dir.clone());
        let gemini_client = GeminiClient::new(
            config.google_api_key.clone(),
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
        );
        let veo3_client = Veo3Client::new(config.veo3_api_key.clone(), config.veo3_base_url.clone())
            .with_request_timeout(config.veo3_request_timeout);
        let video_jobs = VideoJobOrchestrator::new(
            veo3_client.clone(),
            artifact_store.clone(),
            config.video_job.clone(),
        );

        Self {
            config,
            artifact_store,
            gemini_client,
            veo3_client,
            video_jobs,
        }
    }
}

/// Build the full router with logging, CORS and shared state layered on.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::process::process_routes())
        .merge(handlers::video::video_routes())
        .merge(handlers::credits::credit_routes())
        .merge(handlers::status::status_routes())
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
