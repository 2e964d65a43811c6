//! Endpoint for fetching a single expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error, db,
    expense::{ExpenseId, get_expense},
    extract::IdPath,
};

/// The state needed to fetch an expense.
#[derive(Debug, Clone)]
pub struct GetExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for getting an expense by its database ID.
pub async fn get_expense_endpoint(
    State(state): State<GetExpenseState>,
    IdPath(expense_id): IdPath<ExpenseId>,
) -> Result<impl IntoResponse, Error> {
    let connection = db::lock(&state.db_connection)?;
    let expense = get_expense(expense_id, &connection)?;

    Ok(Json(json!({ "expense": expense })))
}
