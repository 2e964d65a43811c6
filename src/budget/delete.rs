//! Budget deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    budget::{BudgetId, delete_budget},
    db,
    extract::IdPath,
};

/// The state needed for deleting a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a budget. Responds with the deleted budget.
///
/// Expenses in the budget's month are kept.
pub async fn delete_budget_endpoint(
    State(state): State<DeleteBudgetState>,
    IdPath(budget_id): IdPath<BudgetId>,
) -> Result<impl IntoResponse, Error> {
    let connection = db::lock(&state.db_connection)?;
    let budget = delete_budget(budget_id, &connection)?;
    tracing::info!("Deleted budget {budget_id}");

    Ok(Json(json!({
        "message": "Budget deleted successfully",
        "deletedBudget": budget,
    })))
}
