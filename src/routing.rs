//! Application router configuration.

use axum::{
    Router, middleware,
    routing::get,
};

use crate::{
    AppState,
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint,
        get_current_budget_endpoint, list_budgets_endpoint, update_budget_endpoint,
    },
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
        get_expense_stats_endpoint, list_expenses_endpoint, update_expense_endpoint,
    },
    health::{get_api_description, get_health},
    internal_server_error::expose_error_detail,
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
///
/// Requests that do not match a route get a JSON 404 response. Internal error details are only
/// shown to clients when `state.environment` is development.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_api_description))
        .route(endpoints::HEALTH, get(get_health))
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE_STATS, get(get_expense_stats_endpoint))
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .patch(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(endpoints::CURRENT_BUDGET, get(get_current_budget_endpoint))
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(
            state.environment,
            expose_error_detail,
        ))
        .with_state(state)
}
