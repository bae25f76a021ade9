// src/handlers/credits.rs
use axum::{extract::Extension, response::Json, routing::get, Router};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::veo_client::CreditBalance;
use crate::AppState;

pub fn credit_routes() -> Router {
    Router::new().route("/api/v1/credits", get(get_credits))
}

/// GET /api/v1/credits - remaining video provider credits, fetched fresh every call
pub async fn get_credits(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<CreditBalance>> {
    let balance = state
        .veo3_client
        .check_credits()
        .await
        .map_err(|e| ApiError::upstream("Failed to check credits", e))?;

    Ok(Json(balance))
}
