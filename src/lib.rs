//! Farm budget is a small REST API for tracking farm expenses against
//! monthly budgets.
//!
//! Expenses and budgets are stored in SQLite. Spending summaries, e.g. how much
//! of this month's budget has been used, are computed on demand from the stored
//! records and never persisted.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod budget;
mod cors;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod extract;
mod health;
mod internal_server_error;
mod logging;
mod month;
mod not_found;
mod pagination;
mod routing;
mod spending;
#[cfg(test)]
mod test_utils;
mod timestamp;
mod timezone;

pub use app_state::{AppState, Environment};
pub use budget::{Budget, NewBudget, create_budget};
pub use cors::build_cors_layer;
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use expense::{Expense, MAX_AMOUNT, NewExpense, create_expense};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use month::MonthRange;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use spending::{BudgetUtilization, SpendingSummary, compare_months, summarize};
pub use timezone::{LocalTimezone, get_local_timezone};

use crate::internal_server_error::InternalServerError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("could not listen for the Ctrl+C signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("could not install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An expense amount was zero or negative.
    #[error("Amount must be a valid number greater than 0")]
    InvalidAmount,

    /// An amount of money above [MAX_AMOUNT].
    #[error("Amounts must be at most 1000000000000")]
    AmountTooLarge,

    /// An expense category was empty or only whitespace.
    #[error("Category must be a non-empty string")]
    EmptyCategory,

    /// A month outside of 1 to 12 (inclusive).
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(i64),

    /// A year outside of the supported budget years.
    #[error("Year must be between 2020 and 9999, got {0}")]
    InvalidYear(i64),

    /// A total budget that is zero or negative.
    #[error("Total budget must be a positive number")]
    InvalidTotalBudget,

    /// A per-category allocation that is negative or has an empty name.
    #[error("Invalid category budget \"{0}\": names must be non-empty and amounts zero or more")]
    InvalidCategoryBudget(String),

    /// Two category allocations have the same name once surrounding whitespace is removed.
    #[error("Category budget \"{0}\" is listed more than once")]
    DuplicateCategoryBudget(String),

    /// An update request that does not set any field.
    #[error("The update must set at least one field")]
    EmptyUpdate,

    /// The page number in a list query was less than one.
    #[error("Page must be a positive integer")]
    InvalidPage,

    /// The page number in a list query was so large that the items before it could not be
    /// skipped.
    ///
    /// Holds the largest page number allowed for the requested page size.
    #[error("Page must be at most {0} for this limit")]
    PageTooLarge(u64),

    /// The page size in a list query was outside of the allowed range.
    ///
    /// Holds the maximum allowed page size.
    #[error("Limit must be between 1 and {0}")]
    InvalidLimit(u64),

    /// A date string that is neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("Invalid date format \"{0}\"")]
    InvalidDate(String),

    /// The request body was not valid JSON for the endpoint.
    #[error("Invalid request body: {0}")]
    InvalidJson(String),

    /// The query string could not be parsed for the endpoint.
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),

    /// The ID in the request path is malformed.
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// There is no active budget for the current month.
    #[error("No budget found for current month")]
    NoCurrentBudget,

    /// A budget already exists for the month and year.
    ///
    /// Holds the existing budget so the client can update it instead.
    #[error("Budget already exists for this month and year")]
    DuplicateBudget(Box<Budget>),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// A column that holds JSON could not be read or written.
    #[error("could not (de)serialize JSON column: {0}")]
    JsonColumn(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Adding up or comparing amounts gave a number too large to represent.
    #[error("the amounts are too large to calculate with")]
    AmountOverflow,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidJson(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidQuery(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidId(rejection.body_text())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidAmount
            | Error::AmountTooLarge
            | Error::EmptyCategory
            | Error::InvalidMonth(_)
            | Error::InvalidYear(_)
            | Error::InvalidTotalBudget
            | Error::InvalidCategoryBudget(_)
            | Error::DuplicateCategoryBudget(_)
            | Error::EmptyUpdate
            | Error::InvalidPage
            | Error::PageTooLarge(_)
            | Error::InvalidLimit(_)
            | Error::InvalidDate(_)
            | Error::InvalidJson(_)
            | Error::InvalidQuery(_)
            | Error::InvalidId(_) => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::NoCurrentBudget => StatusCode::NOT_FOUND,
            Error::DuplicateBudget(_) => StatusCode::CONFLICT,
            Error::InvalidTimezone(_)
            | Error::JsonColumn(_)
            | Error::SqlError(_)
            | Error::AmountOverflow
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        match self {
            Error::DuplicateBudget(existing_budget) => (
                status,
                Json(json!({
                    "error": message,
                    "existingBudget": existing_budget,
                })),
            )
                .into_response(),
            Error::NoCurrentBudget => (
                status,
                Json(json!({
                    "error": message,
                    "message": "Please create a budget for this month",
                })),
            )
                .into_response(),
            // The details of internal errors are only shown to the client in development mode,
            // see `internal_server_error::expose_error_detail`.
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", message);
                InternalServerError::with_detail(message).into_response()
            }
            _ => (status, Json(json!({ "error": message }))).into_response(),
        }
    }
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{
        Error,
        internal_server_error::InternalErrorDetail,
        test_utils::{assert_json_error, parse_json_body},
    };

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let response = Error::InvalidMonth(13).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_error(response, "Month must be between 1 and 12, got 13").await;
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = Error::NotFound.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn no_current_budget_includes_hint() {
        let response = Error::NoCurrentBudget.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = parse_json_body(response).await;
        assert_eq!(body["error"], "No budget found for current month");
        assert_eq!(body["message"], "Please create a budget for this month");
    }

    #[tokio::test]
    async fn internal_errors_hide_detail_and_attach_it_as_extension() {
        let response = Error::DatabaseLockError.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<InternalErrorDetail>(),
            Some(&InternalErrorDetail(
                "could not acquire the database lock".to_owned()
            ))
        );
        let body = parse_json_body(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "Something went wrong");
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}
