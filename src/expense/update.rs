//! Endpoint for partially updating an expense.

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
    expense::{
        Category, ExpenseId, ExpenseUpdate, ExpenseUpdateForm, domain::validate_amount,
        update_expense,
    },
    extract::{IdPath, JsonBody},
    timestamp::{DayBoundary, parse_timestamp},
    timezone::{LocalTimezone, local_timezone_or_error},
};

/// The state needed to update an expense.
#[derive(Debug, Clone)]
pub struct UpdateExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl ExpenseUpdateForm {
    /// Validate the fields that are set, using the same rules as for new expenses.
    ///
    /// # Errors
    /// Returns [Error::EmptyUpdate] if no field is set, or the validation error for the first
    /// invalid field.
    fn into_update(self, timezone: LocalTimezone) -> Result<ExpenseUpdate, Error> {
        let update = ExpenseUpdate {
            amount: self.amount.map(validate_amount).transpose()?,
            category: self.category.as_deref().map(Category::new).transpose()?,
            date: self
                .date
                .as_deref()
                .map(|date| parse_timestamp(date, DayBoundary::Start, timezone))
                .transpose()?,
            description: self
                .description
                .map(|description| description.trim().to_owned()),
        };

        if update.is_empty() {
            Err(Error::EmptyUpdate)
        } else {
            Ok(update)
        }
    }
}

/// A route handler for changing some of the fields of an expense.
pub async fn update_expense_endpoint(
    State(state): State<UpdateExpenseState>,
    IdPath(expense_id): IdPath<ExpenseId>,
    JsonBody(form): JsonBody<ExpenseUpdateForm>,
) -> Result<impl IntoResponse, Error> {
    let timezone = local_timezone_or_error(&state.local_timezone)?;
    let update = form.into_update(timezone)?;

    let connection = db::lock(&state.db_connection)?;
    let expense = update_expense(expense_id, update, &connection)?;
    tracing::info!("Updated expense {}", expense.id);

    Ok(Json(json!({
        "message": "Expense updated successfully",
        "expense": expense,
    })))
}
