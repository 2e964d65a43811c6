//! Cross-origin resource sharing for the browser front-end.

use axum::http::{
    HeaderName, HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::Environment;

/// The origins of the front-end dev servers that are allowed in development mode.
pub const DEVELOPMENT_ORIGINS: [&str; 5] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:5174",
    "http://127.0.0.1:5173",
    "http://127.0.0.1:5174",
];

/// Build the CORS layer for the server.
///
/// In development mode the local front-end dev servers are allowed, along with `frontend_url` if
/// given. In production mode only `frontend_url` is allowed, and no cross-origin requests are
/// allowed if it is not set.
///
/// # Errors
/// Returns an error if `frontend_url` is not a valid header value.
pub fn build_cors_layer(
    environment: Environment,
    frontend_url: Option<&str>,
) -> Result<CorsLayer, InvalidHeaderValue> {
    let mut origins: Vec<HeaderValue> = match environment {
        Environment::Development => DEVELOPMENT_ORIGINS
            .into_iter()
            .map(HeaderValue::from_static)
            .collect(),
        Environment::Production => Vec::new(),
    };

    if let Some(frontend_url) = frontend_url {
        origins.push(HeaderValue::from_str(frontend_url.trim_end_matches('/'))?);
    }

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true))
}
