//! The fallback for requests that do not match any route.

use axum::{
    Json,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::endpoints::AVAILABLE_ENDPOINTS;

/// Respond with a JSON 404 that names the unmatched route and lists the available endpoints.
pub async fn get_404_not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "message": format!("Cannot {method} {}", uri.path()),
            "availableEndpoints": AVAILABLE_ENDPOINTS,
        })),
    )
        .into_response()
}
