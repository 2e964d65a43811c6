use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};

#[track_caller]
pub(crate) fn assert_status_ok(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK);
}

#[track_caller]
pub(crate) fn assert_json_content_type(response: &Response<Body>) {
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .expect("content-type header missing");
    assert_eq!(content_type, "application/json");
}

/// The `Location` header of a `201 Created` response.
#[track_caller]
pub(crate) fn get_location(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::CREATED);

    response
        .headers()
        .get(header::LOCATION)
        .expect("Headers missing location")
        .to_str()
        .expect("Could not convert to str")
        .to_owned()
}
