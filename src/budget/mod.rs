//! Budgets: how much may be spent on the farm in a calendar month.
//!
//! There is at most one budget per month and year. Budgets are matched to expenses by the
//! expense date, see [crate::month::MonthRange].

mod create;
mod current;
mod db;
mod delete;
mod domain;
mod get;
mod list;
mod update;

pub use create::create_budget_endpoint;
pub use current::get_current_budget_endpoint;
pub use db::{
    create_budget, create_budget_table, delete_budget, find_active_budget, get_budget,
    list_budgets, update_budget,
};
pub use delete::delete_budget_endpoint;
pub use domain::{
    Budget, BudgetFilter, BudgetForm, BudgetId, BudgetUpdate, BudgetUpdateForm, CategoryBudgets,
    DEFAULT_OWNER_SCOPE, NewBudget, validate_year,
};
pub use get::get_budget_endpoint;
pub use list::list_budgets_endpoint;
pub use update::update_budget_endpoint;
