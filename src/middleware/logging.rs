use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

/// Logs every request once on arrival and once on completion, tagged with a
/// per-request id. Completion is logged at a level matching the status class.
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_owned());
    let remote_addr = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %matched_path,
        uri = %uri,
        remote_addr = %remote_addr,
        "incoming request"
    );

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis();

    macro_rules! completed {
        ($level:ident, $msg:literal) => {
            tracing::$level!(
                request_id = %request_id,
                method = %method,
                path = %matched_path,
                status,
                duration_ms = %duration_ms,
                $msg
            )
        };
    }

    match status {
        400..=499 => completed!(warn, "request completed (client error)"),
        500..=599 => completed!(error, "request completed (server error)"),
        _ => completed!(info, "request completed"),
    }

    response
}
