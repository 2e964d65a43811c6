//! Expenses: money spent on the farm, e.g. seeds, equipment and labor.
//!
//! This module has the domain types, the database queries and the route handlers for creating,
//! listing, updating and deleting expenses, as well as the monthly spending statistics.

mod create;
mod db;
mod delete;
mod domain;
mod get;
mod list;
mod stats;
mod update;

pub use create::create_expense_endpoint;
pub use db::{
    create_expense, create_expense_table, delete_expense, get_expense, get_expenses_in_month,
    list_expenses, update_expense,
};
pub use delete::delete_expense_endpoint;
pub use domain::{
    Category, Expense, ExpenseFilter, ExpenseForm, ExpenseId, ExpenseUpdate, ExpenseUpdateForm,
    MAX_AMOUNT, NewExpense,
};
pub use get::get_expense_endpoint;
pub use list::list_expenses_endpoint;
pub use stats::get_expense_stats_endpoint;
pub use update::update_expense_endpoint;
