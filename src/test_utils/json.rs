use axum::{body::Body, response::Response};
use serde_json::Value;

use super::assert_json_content_type;

pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    assert_json_content_type(&response);

    let body = response.into_body();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Could not get response body");

    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}

/// Check that `response` has a JSON body of the form `{"error": want_message, ...}`.
pub(crate) async fn assert_json_error(response: Response<Body>, want_message: &str) {
    let body = parse_json_body(response).await;

    assert_eq!(
        body["error"], want_message,
        "unexpected error message in response body {body}"
    );
}
