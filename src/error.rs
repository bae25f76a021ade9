// src/error.rs
//! Errors surfaced over HTTP.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed caller input.
    #[error("{0}")]
    Validation(String),

    /// A downstream call failed; `details` carries the underlying message verbatim.
    #[error("{context}: {details}")]
    Upstream {
        context: &'static str,
        details: String,
    },
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(context: &'static str, err: impl Display) -> Self {
        Self::Upstream {
            context,
            details: err.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Validation(error) => ErrorResponse {
                error,
                details: None,
            },
            ApiError::Upstream { context, details } => {
                tracing::error!("{}: {}", context, details);
                ErrorResponse {
                    error: context.to_string(),
                    details: Some(details),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
