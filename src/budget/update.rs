//! Endpoint for partially updating a budget.

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
    budget::{BudgetId, BudgetUpdate, BudgetUpdateForm, update_budget},
    db,
    extract::{IdPath, JsonBody},
};

/// The state needed to update a budget.
#[derive(Debug, Clone)]
pub struct UpdateBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for changing the total, the category allocations or the active flag of a
/// budget.
///
/// New category allocations replace the old ones entirely.
pub async fn update_budget_endpoint(
    State(state): State<UpdateBudgetState>,
    IdPath(budget_id): IdPath<BudgetId>,
    JsonBody(form): JsonBody<BudgetUpdateForm>,
) -> Result<impl IntoResponse, Error> {
    let update = BudgetUpdate::try_from(form)?;

    let connection = db::lock(&state.db_connection)?;
    let budget = update_budget(budget_id, update, &connection)?;
    tracing::info!("Updated budget {}", budget.id);

    Ok(Json(json!({
        "message": "Budget updated successfully",
        "budget": budget,
    })))
}
