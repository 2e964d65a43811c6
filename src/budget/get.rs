//! Endpoint for fetching a single budget.

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
    budget::{BudgetId, get_budget},
    db,
    extract::IdPath,
};

/// The state needed to fetch a budget.
#[derive(Debug, Clone)]
pub struct GetBudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for getting a budget by its database ID.
pub async fn get_budget_endpoint(
    State(state): State<GetBudgetState>,
    IdPath(budget_id): IdPath<BudgetId>,
) -> Result<impl IntoResponse, Error> {
    let connection = db::lock(&state.db_connection)?;
    let budget = get_budget(budget_id, &connection)?;

    Ok(Json(json!({ "budget": budget })))
}
