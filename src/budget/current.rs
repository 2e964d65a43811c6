//! Endpoint for the budget and spending of the current month.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    budget::{Budget, find_active_budget},
    db,
    expense::get_expenses_in_month,
    month::MonthRange,
    spending::{SpendingSummary, summarize},
    timestamp,
    timezone::{LocalTimezone, local_timezone_or_error},
};

/// The state needed for the current budget.
#[derive(Debug, Clone)]
pub struct CurrentBudgetState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The database connection for reading budgets and expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CurrentBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A budget along with how much of it has been spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetWithSpending {
    pub budget: Budget,
    pub spending: SpendingSummary,
}

/// Get the active budget for the month containing `now` and summarize that month's spending.
///
/// # Errors
/// Returns [Error::NoCurrentBudget] if the month has no active budget.
fn current_budget(
    now: OffsetDateTime,
    timezone: LocalTimezone,
    connection: &Connection,
) -> Result<BudgetWithSpending, Error> {
    let month = MonthRange::containing(now, timezone)?;

    let budget = find_active_budget(u8::from(month.month()), month.year(), connection)?
        .ok_or(Error::NoCurrentBudget)?;
    let expenses = get_expenses_in_month(month, connection)?;
    let spending = summarize(month, &expenses, Some(&budget))?;

    Ok(BudgetWithSpending { budget, spending })
}

/// A route handler for the current month's budget and spending.
pub async fn get_current_budget_endpoint(
    State(state): State<CurrentBudgetState>,
) -> Result<impl IntoResponse, Error> {
    let timezone = local_timezone_or_error(&state.local_timezone)?;

    let connection = db::lock(&state.db_connection)?;
    let budget_with_spending = current_budget(timestamp::now(), timezone, &connection)?;

    Ok(Json(budget_with_spending))
}
