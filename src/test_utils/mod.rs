#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod http;
pub(crate) mod json;

pub(crate) use db::{get_test_app_state, get_test_db_connection};
pub(crate) use http::{assert_json_content_type, assert_status_ok, get_location};
pub(crate) use json::{assert_json_error, parse_json_body};
