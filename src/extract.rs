//! Request extractors that reject malformed input with the app's JSON error responses instead of
//! axum's plain text ones.

use axum::extract::{FromRequest, FromRequestParts};

use crate::Error;

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// The query string parameters of a request.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);

/// A record ID taken from the request path.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct IdPath<T>(pub T);
