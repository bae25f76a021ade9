// src/handlers/process.rs
//! Image + prompt → text, via Gemini.

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, Extension},
    response::Json,
    routing::post,
    Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::process::ProcessResponse;
use crate::AppState;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn process_routes() -> Router {
    Router::new()
        .route("/api/v1/process", post(process_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /api/v1/process - multipart `image` file plus `prompt` field
pub async fn process_image(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Json<ProcessResponse>> {
    let (image_path, prompt) = read_upload(&state, multipart).await?;

    let (image_path, prompt) = match (image_path, prompt) {
        (Some(path), Some(prompt)) => (path, prompt),
        (image_path, _) => {
            if let Some(path) = image_path {
                state.artifact_store.delete(&path).await;
            }
            return Err(ApiError::validation("Both image and prompt are required"));
        }
    };

    let text = state
        .gemini_client
        .generate_from_image(&state.artifact_store, &image_path, &prompt)
        .await
        .map_err(|e| ApiError::upstream("Failed to process the request", e))?;

    Ok(Json(ProcessResponse { response: text }))
}

/// Store the `image` part in the artifact directory and collect the `prompt`.
async fn read_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> ApiResult<(Option<PathBuf>, Option<String>)> {
    let mut image_path: Option<PathBuf> = None;
    let mut prompt: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some(path) = image_path.take() {
                    state.artifact_store.delete(&path).await;
                }
                return Err(ApiError::validation(format!("Invalid multipart body: {e}")));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") if image_path.is_none() => {
                let stored_name = upload_name(field.file_name().unwrap_or_default());
                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(e) => {
                        return Err(ApiError::validation(format!("Failed to read image: {e}")));
                    }
                };
                let path = state
                    .artifact_store
                    .write(&stored_name, &data)
                    .await
                    .map_err(|e| ApiError::upstream("Failed to process the request", e))?;
                tracing::debug!("📁 Stored upload {} ({} bytes)", path.display(), data.len());
                image_path = Some(path);
            }
            Some("prompt") => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(e) => {
                        if let Some(path) = image_path.take() {
                            state.artifact_store.delete(&path).await;
                        }
                        return Err(ApiError::validation(format!("Failed to read prompt: {e}")));
                    }
                };
                if !text.trim().is_empty() {
                    prompt = Some(text);
                }
            }
            _ => {}
        }
    }

    Ok((image_path, prompt))
}

/// `<unix millis>-<short id><original extension>`
fn upload_name(original: &str) -> String {
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}{}",
        chrono::Utc::now().timestamp_millis(),
        &id[..8],
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_name_keeps_extension() {
        let name = upload_name("holiday.JPG");
        assert!(name.ends_with(".JPG"));
        assert!(name.split('-').next().unwrap().parse::<i64>().is_ok());
    }

    #[test]
    fn test_upload_name_without_extension() {
        let name = upload_name("");
        assert!(!name.contains('.'));
    }
}
