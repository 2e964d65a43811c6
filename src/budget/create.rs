//! Budget creation endpoint.

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
    AppState, Error,
    budget::{BudgetForm, create_budget},
    db,
    endpoints::{self, format_endpoint},
    extract::JsonBody,
};

/// The state needed for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for setting the budget of a month.
///
/// Responds with 409 Conflict and the existing budget if the month already has a budget.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    JsonBody(form): JsonBody<BudgetForm>,
) -> Result<impl IntoResponse, Error> {
    let new_budget = form.into_new_budget()?;

    let connection = db::lock(&state.db_connection)?;
    let budget = create_budget(new_budget, &connection)?;
    tracing::info!(
        "New budget {} created for {}-{:02}",
        budget.id,
        budget.year,
        budget.month
    );

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format_endpoint(endpoints::BUDGET, budget.id))],
        Json(json!({
            "message": "Budget created successfully",
            "budget": budget,
        })),
    ))
}

#[cfg(test)]
mod create_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        budget::{BudgetForm, CategoryBudgets},
        extract::JsonBody,
        test_utils::{assert_json_error, get_location, get_test_db_connection, parse_json_body},
    };

    use super::{CreateBudgetState, create_budget_endpoint};

    fn get_create_budget_state() -> CreateBudgetState {
        CreateBudgetState {
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        }
    }

    fn march_form() -> BudgetForm {
        BudgetForm {
            month: 3,
            year: 2024,
            total_budget: dec!(2000),
            category_budgets: Some(CategoryBudgets::from([("Seeds".to_owned(), dec!(800))])),
        }
    }

    #[tokio::test]
    async fn can_create_budget() {
        let state = get_create_budget_state();

        let response = create_budget_endpoint(State(state), JsonBody(march_form()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = get_location(&response);
        let body = parse_json_body(response).await;
        assert_eq!(body["message"], "Budget created successfully");
        assert_eq!(body["budget"]["month"], 3);
        assert_eq!(body["budget"]["year"], 2024);
        assert_eq!(body["budget"]["isActive"], true);
        assert_eq!(body["budget"]["ownerScope"], "default");
        assert_eq!(body["budget"]["categoryBudgets"]["Seeds"], 800.0);
        let id = body["budget"]["id"].as_i64().unwrap();
        assert_eq!(location, format!("/api/budgets/{id}"));
    }

    #[tokio::test]
    async fn duplicate_month_is_conflict_with_existing_budget() {
        let state = get_create_budget_state();
        let first = create_budget_endpoint(State(state.clone()), JsonBody(march_form()))
            .await
            .into_response();
        let first_id = parse_json_body(first).await["budget"]["id"].clone();

        let response = create_budget_endpoint(State(state), JsonBody(march_form()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = parse_json_body(response).await;
        assert_eq!(body["error"], "Budget already exists for this month and year");
        assert_eq!(body["existingBudget"]["id"], first_id);
    }

    #[tokio::test]
    async fn rejects_year_before_2020() {
        let state = get_create_budget_state();
        let form = BudgetForm {
            year: 2019,
            ..march_form()
        };

        let response = create_budget_endpoint(State(state), JsonBody(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_error(response, &Error::InvalidYear(2019).to_string()).await;
    }

    #[tokio::test]
    async fn rejects_negative_category_budget() {
        let state = get_create_budget_state();
        let form = BudgetForm {
            category_budgets: Some(CategoryBudgets::from([("Labor".to_owned(), dec!(-5))])),
            ..march_form()
        };

        let response = create_budget_endpoint(State(state.clone()), JsonBody(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM budget", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_creates_give_one_success_and_one_conflict() {
        let state = get_create_budget_state();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    create_budget_endpoint(State(state), JsonBody(march_form()))
                        .await
                        .into_response()
                        .status()
                        .as_u16()
                })
            })
            .collect();

        let mut statuses = Vec::new();
        for handle in handles {
            statuses.push(handle.await.unwrap());
        }
        statuses.sort();

        assert_eq!(
            statuses,
            [StatusCode::CREATED.as_u16(), StatusCode::CONFLICT.as_u16()]
        );
    }
}
