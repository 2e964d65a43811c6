//! Endpoint for listing expenses page by page.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, db,
    expense::{ExpenseFilter, list_expenses},
    extract::QueryParams,
    pagination::{PageRequest, Paginated, PaginationConfig},
    timestamp::{DayBoundary, parse_timestamp},
    timezone::{LocalTimezone, local_timezone_or_error},
};

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The config that controls the page size.
    pub pagination_config: PaginationConfig,
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing expenses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExpensesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ListExpensesQuery {
    fn filter(&self, timezone: LocalTimezone) -> Result<ExpenseFilter, Error> {
        let parse_date = |date: Option<&str>, boundary| {
            non_blank(date)
                .map(|date| parse_timestamp(date, boundary, timezone))
                .transpose()
        };

        Ok(ExpenseFilter {
            search: non_blank(self.search.as_deref()).map(str::to_owned),
            category: non_blank(self.category.as_deref()).map(str::to_owned),
            start: parse_date(self.start_date.as_deref(), DayBoundary::Start)?,
            end: parse_date(self.end_date.as_deref(), DayBoundary::End)?,
        })
    }
}

/// Query parameters that are sent but left empty do not filter.
fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}

/// A route handler for listing expenses, newest first.
///
/// A bare `YYYY-MM-DD` end date includes the whole of that day.
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesState>,
    QueryParams(query): QueryParams<ListExpensesQuery>,
) -> Result<impl IntoResponse, Error> {
    let page = PageRequest::new(query.page, query.limit, &state.pagination_config)?;
    let timezone = local_timezone_or_error(&state.local_timezone)?;
    let filter = query.filter(timezone)?;

    let connection = db::lock(&state.db_connection)?;
    let (expenses, total) = list_expenses(&filter, page, &connection)?;

    Ok(Json(Paginated::new(expenses, page, total)))
}
