//! Middleware for logging requests and responses.

use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of characters of a request or response body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest body that is read into memory for logging, the same as axum's
/// [axum::extract::DefaultBodyLimit]. Larger bodies, and bodies of unknown length, are passed on
/// without being logged.
const MAX_LOGGED_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Log the request and response for each request.
///
/// The method, path, status and latency are logged at the `info` level along with the first
/// [LOG_BODY_LENGTH_LIMIT] characters of the bodies. Longer bodies are logged in full at the
/// `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let uri = parts.uri.clone();

    let body = match log_body_of(&format!("Received request {method} {uri}"), body).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read body of request {method} {uri}: {error}");
            return (StatusCode::BAD_REQUEST, "Could not read request body").into_response();
        }
    };

    let response = next.run(Request::from_parts(parts, body)).await;

    let (parts, body) = response.into_parts();
    let summary = format!(
        "Sending response {} for {method} {uri} after {:?}",
        parts.status,
        started.elapsed()
    );
    let body = match log_body_of(&summary, body).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read body of response to {method} {uri}: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Response::from_parts(parts, body)
}

/// Log `summary` along with `body` if it is small enough to read, and return a body with the
/// same content.
async fn log_body_of(summary: &str, body: Body) -> Result<Body, axum::Error> {
    if !is_loggable(&body) {
        tracing::info!("{summary}\nbody: <not logged>");
        return Ok(body);
    }

    let bytes = axum::body::to_bytes(body, MAX_LOGGED_BODY_SIZE).await?;
    log_body(summary, &bytes);

    Ok(Body::from(bytes))
}

fn is_loggable(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|size| size <= MAX_LOGGED_BODY_SIZE as u64)
}

fn log_body(summary: &str, body: &[u8]) {
    let text = String::from_utf8_lossy(body);

    match truncate_chars(&text, LOG_BODY_LENGTH_LIMIT) {
        Some(truncated) => {
            tracing::info!("{summary}\nbody: {truncated}...");
            tracing::debug!("Full body: {text:?}");
        }
        None => tracing::info!("{summary}\nbody: {text:?}"),
    }
}

/// The first `limit` characters of `text`, or `None` if `text` is not longer than `limit`.
fn truncate_chars(text: &str, limit: usize) -> Option<&str> {
    text.char_indices()
        .nth(limit)
        .map(|(byte_index, _)| &text[..byte_index])
}

#[cfg(test)]
mod truncate_tests {
    use super::truncate_chars;

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(truncate_chars("seeds", 5), None);
    }

    #[test]
    fn long_text_is_cut_at_limit() {
        assert_eq!(truncate_chars("fertilizer", 4), Some("fert"));
    }

    #[test]
    fn does_not_split_multi_byte_characters() {
        assert_eq!(truncate_chars("₹₹₹₹", 2), Some("₹₹"));
    }
}
