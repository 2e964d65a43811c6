//! Expense deletion endpoint.

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
    expense::{ExpenseId, delete_expense},
    extract::IdPath,
};

/// The state needed for deleting an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense. Responds with the deleted expense.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    IdPath(expense_id): IdPath<ExpenseId>,
) -> Result<impl IntoResponse, Error> {
    let connection = db::lock(&state.db_connection)?;
    let expense = delete_expense(expense_id, &connection)?;
    tracing::info!("Deleted expense {expense_id}");

    Ok(Json(json!({
        "message": "Expense deleted successfully",
        "deletedExpense": expense,
    })))
}
