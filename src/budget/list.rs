//! Endpoint for listing budgets page by page.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    budget::{BudgetFilter, list_budgets, validate_year},
    db,
    extract::QueryParams,
    month::month_from_number,
    pagination::{PageRequest, Paginated, PaginationConfig},
};

/// The state needed to list budgets.
#[derive(Debug, Clone)]
pub struct ListBudgetsState {
    /// The config that controls the page size.
    pub pagination_config: PaginationConfig,
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListBudgetsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing budgets.
#[derive(Debug, Default, Deserialize)]
pub struct ListBudgetsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub year: Option<i64>,
    pub month: Option<i64>,
}

impl ListBudgetsQuery {
    fn filter(&self) -> Result<BudgetFilter, Error> {
        Ok(BudgetFilter {
            year: self.year.map(validate_year).transpose()?,
            month: self
                .month
                .map(|month| month_from_number(month).map(u8::from))
                .transpose()?,
        })
    }
}

/// A route handler for listing budgets, most recent month first.
pub async fn list_budgets_endpoint(
    State(state): State<ListBudgetsState>,
    QueryParams(query): QueryParams<ListBudgetsQuery>,
) -> Result<impl IntoResponse, Error> {
    let page = PageRequest::new(query.page, query.limit, &state.pagination_config)?;
    let filter = query.filter()?;

    let connection = db::lock(&state.db_connection)?;
    let (budgets, total) = list_budgets(filter, page, &connection)?;

    Ok(Json(Paginated::new(budgets, page, total)))
}
