//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

/// The root route which describes the API.
pub const ROOT: &str = "/";
/// The route for checking whether the server and database are up.
pub const HEALTH: &str = "/api/health";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route for the spending summary of a month.
pub const EXPENSE_STATS: &str = "/api/expenses/stats";
/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for the budget and spending of the current month.
pub const CURRENT_BUDGET: &str = "/api/budgets/current";

/// The method and path of every API route, used to describe the API to clients.
pub const AVAILABLE_ENDPOINTS: [&str; 14] = [
    "GET /api/health",
    "GET /api/expenses",
    "GET /api/expenses/stats",
    "GET /api/expenses/{expense_id}",
    "POST /api/expenses",
    "PATCH /api/expenses/{expense_id}",
    "DELETE /api/expenses/{expense_id}",
    "GET /api/budgets",
    "GET /api/budgets/current",
    "GET /api/budgets/{budget_id}",
    "POST /api/budgets",
    "PUT /api/budgets/{budget_id}",
    "DELETE /api/budgets/{budget_id}",
    "GET /",
];

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the text between a pair of braces, e.g. '{expense_id}' in
/// '/api/expenses/{expense_id}'. Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}
