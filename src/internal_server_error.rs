//! Defines the JSON response for an internal server error and the middleware that decides how
//! much of the underlying error the client gets to see.
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::Environment;

/// The full error message of an internal server error.
///
/// Attached to the response as an extension so that it never reaches the client unless
/// [expose_error_detail] decides it should.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalErrorDetail(pub String);

/// The response for errors the client cannot do anything about, e.g. a failed SQL query.
///
/// The client only sees a generic message.
pub struct InternalServerError {
    detail: Option<String>,
}

impl InternalServerError {
    /// Create an internal server error that keeps `detail` for [expose_error_detail].
    pub fn with_detail(detail: String) -> Self {
        Self {
            detail: Some(detail),
        }
    }

    fn into_json(message: &str) -> Json<serde_json::Value> {
        Json(json!({
            "error": "Internal server error",
            "message": message,
        }))
    }
}

impl IntoResponse for InternalServerError {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            Self::into_json("Something went wrong"),
        )
            .into_response();

        if let Some(detail) = self.detail {
            response.extensions_mut().insert(InternalErrorDetail(detail));
        }

        response
    }
}

/// Replace the generic message of internal server error responses with the underlying error
/// message when running in development mode.
pub async fn expose_error_detail(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if environment != Environment::Development {
        return response;
    }

    let detail = response.extensions().get::<InternalErrorDetail>().cloned();

    match detail {
        Some(InternalErrorDetail(detail)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            InternalServerError::into_json(&detail),
        )
            .into_response(),
        None => response,
    }
}
