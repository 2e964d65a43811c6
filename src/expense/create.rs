//! Expense creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error, db,
    endpoints::{self, format_endpoint},
    expense::{ExpenseForm, NewExpense, create_expense},
    extract::JsonBody,
    timestamp::{self, DayBoundary, parse_timestamp},
    timezone::local_timezone_or_error,
};

/// The state needed for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new expense.
///
/// A missing date means the expense happened now. A bare `YYYY-MM-DD` date is taken as the start
/// of that day in the local timezone.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    JsonBody(form): JsonBody<ExpenseForm>,
) -> Result<impl IntoResponse, Error> {
    let timezone = local_timezone_or_error(&state.local_timezone)?;

    let date = match form.date.as_deref() {
        Some(date) => parse_timestamp(date, DayBoundary::Start, timezone)?,
        None => timestamp::now(),
    };

    let new_expense = NewExpense::new(
        form.amount,
        &form.category,
        date,
        form.description.as_deref().unwrap_or_default(),
    )?;

    let connection = db::lock(&state.db_connection)?;
    let expense = create_expense(new_expense, &connection)?;
    tracing::info!("New expense created: {}", expense.id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format_endpoint(endpoints::EXPENSE, expense.id))],
        Json(json!({
            "message": "Expense created successfully",
            "expense": expense,
        })),
    ))
}

#[cfg(test)]
mod create_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        Error,
        expense::{ExpenseForm, get_expense},
        extract::JsonBody,
        test_utils::{assert_json_error, get_location, get_test_db_connection, parse_json_body},
    };

    use super::{CreateExpenseState, create_expense_endpoint};

    fn get_create_expense_state(local_timezone: &str) -> CreateExpenseState {
        CreateExpenseState {
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        }
    }

    fn form(amount: rust_decimal::Decimal, category: &str, date: Option<&str>) -> ExpenseForm {
        ExpenseForm {
            amount,
            category: category.to_owned(),
            date: date.map(str::to_owned),
            description: Some(" 20kg maize seed ".to_owned()),
        }
    }

    #[tokio::test]
    async fn can_create_expense() {
        let state = get_create_expense_state("Etc/UTC");

        let response = create_expense_endpoint(
            State(state.clone()),
            JsonBody(form(dec!(1500), "Seeds", Some("2024-03-15T09:30:00Z"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = get_location(&response);
        let body = parse_json_body(response).await;
        assert_eq!(body["message"], "Expense created successfully");
        assert_eq!(body["expense"]["category"], "Seeds");
        assert_eq!(body["expense"]["description"], "20kg maize seed");
        assert_eq!(body["expense"]["date"], "2024-03-15T09:30:00Z");

        let id = body["expense"]["id"].as_i64().unwrap();
        assert_eq!(location, format!("/api/expenses/{id}"));
        let stored = get_expense(id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(stored.amount, dec!(1500));
        assert_eq!(stored.date, datetime!(2024-03-15 09:30:00 UTC));
    }

    #[tokio::test]
    async fn bare_date_is_start_of_local_day() {
        let state = get_create_expense_state("Asia/Kolkata");

        let response = create_expense_endpoint(
            State(state.clone()),
            JsonBody(form(dec!(10), "Labor", Some("2024-03-15"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_json_body(response).await;
        assert_eq!(body["expense"]["date"], "2024-03-14T18:30:00Z");
    }

    #[tokio::test]
    async fn bare_winter_date_uses_standard_time() {
        let state = get_create_expense_state("America/New_York");

        let response = create_expense_endpoint(
            State(state),
            JsonBody(form(dec!(10), "Labor", Some("2024-01-15"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_json_body(response).await;
        assert_eq!(body["expense"]["date"], "2024-01-15T05:00:00Z");
    }

    #[tokio::test]
    async fn missing_date_defaults_to_now() {
        let state = get_create_expense_state("Etc/UTC");
        let before = crate::timestamp::now();

        let response =
            create_expense_endpoint(State(state.clone()), JsonBody(form(dec!(10), "Labor", None)))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_json_body(response).await;
        let id = body["expense"]["id"].as_i64().unwrap();
        let stored = get_expense(id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(stored.date >= before);
        assert!(stored.date <= crate::timestamp::now());
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let state = get_create_expense_state("Etc/UTC");

        let response =
            create_expense_endpoint(State(state.clone()), JsonBody(form(dec!(0), "Seeds", None)))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_error(response, &Error::InvalidAmount.to_string()).await;
        let count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM expense", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn rejects_blank_category() {
        let state = get_create_expense_state("Etc/UTC");

        let response =
            create_expense_endpoint(State(state), JsonBody(form(dec!(10), "  ", None)))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_error(response, &Error::EmptyCategory.to_string()).await;
    }

    #[tokio::test]
    async fn rejects_invalid_date() {
        let state = get_create_expense_state("Etc/UTC");

        let response = create_expense_endpoint(
            State(state),
            JsonBody(form(dec!(10), "Seeds", Some("15/03/2024"))),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_error(response, "Invalid date format \"15/03/2024\"").await;
    }
}
