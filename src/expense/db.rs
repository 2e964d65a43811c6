//! Database operations for expenses.

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::decimal_from_column,
    expense::{Category, Expense, ExpenseFilter, ExpenseId, ExpenseUpdate, NewExpense},
    month::MonthRange,
    pagination::PageRequest,
    timestamp::{self, timestamp_from_column},
};

const EXPENSE_COLUMNS: &str = "id, amount, category, date, description, created_at, updated_at";

/// Initialize the expense table and indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            date INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
    )?;

    Ok(())
}

/// Save a new expense and return it with its generated ID and timestamps.
pub fn create_expense(new_expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    let now = timestamp::now();

    connection.execute(
        "INSERT INTO expense (amount, category, date, description, created_at, updated_at) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
        (
            new_expense.amount.to_string(),
            new_expense.category.as_ref(),
            new_expense.date.unix_timestamp(),
            &new_expense.description,
            now.unix_timestamp(),
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Expense {
        id,
        amount: new_expense.amount,
        category: new_expense.category,
        date: new_expense.date,
        description: new_expense.description,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve a single expense by ID.
///
/// # Errors
/// Returns [Error::NotFound] if there is no expense with the ID.
pub fn get_expense(expense_id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id;"
        ))?
        .query_row(&[(":id", &expense_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve one page of the expenses matching `filter`, newest first, along with the total
/// number of matching expenses.
///
/// The date range in `filter` is inclusive on both ends.
pub fn list_expenses(
    filter: &ExpenseFilter,
    page: PageRequest,
    connection: &Connection,
) -> Result<(Vec<Expense>, u64), Error> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(search) = &filter.search {
        params.push(Value::Text(contains_pattern(search)));
        let index = params.len();
        conditions.push(format!(
            "(category LIKE ?{index} ESCAPE '\\' OR description LIKE ?{index} ESCAPE '\\')"
        ));
    }

    if let Some(category) = &filter.category {
        params.push(Value::Text(contains_pattern(category)));
        conditions.push(format!("category LIKE ?{} ESCAPE '\\'", params.len()));
    }

    if let Some(start) = filter.start {
        params.push(Value::Integer(start.unix_timestamp()));
        conditions.push(format!("date >= ?{}", params.len()));
    }

    if let Some(end) = filter.end {
        params.push(Value::Integer(end.unix_timestamp()));
        conditions.push(format!("date <= ?{}", params.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let total: i64 = connection
        .prepare(&format!("SELECT COUNT(*) FROM expense{where_clause};"))?
        .query_row(params_from_iter(params.iter()), |row| row.get(0))?;

    let limit_index = params.len() + 1;
    params.push(Value::Integer(page.limit as i64));
    params.push(Value::Integer(page.offset()));

    // Sort by date, and then ID to keep the order stable for expenses on the same date.
    let expenses = connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense{where_clause} \
            ORDER BY date DESC, id DESC LIMIT ?{limit_index} OFFSET ?{};",
            limit_index + 1
        ))?
        .query_map(params_from_iter(params.iter()), map_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok((expenses, total as u64))
}

/// Retrieve all expenses dated within `month`, oldest first.
pub fn get_expenses_in_month(
    month: MonthRange,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense \
            WHERE date >= ?1 AND date < ?2 \
            ORDER BY date ASC, id ASC;"
        ))?
        .query_map(
            [
                month.start().unix_timestamp(),
                month.end_exclusive().unix_timestamp(),
            ],
            map_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Apply a partial update to an expense and return the updated expense.
///
/// # Errors
/// Returns [Error::NotFound] if there is no expense with the ID.
pub fn update_expense(
    expense_id: ExpenseId,
    update: ExpenseUpdate,
    connection: &Connection,
) -> Result<Expense, Error> {
    let mut expense = get_expense(expense_id, connection)?;
    update.apply(&mut expense);
    expense.updated_at = timestamp::now();

    let rows_affected = connection.execute(
        "UPDATE expense SET amount = ?1, category = ?2, date = ?3, description = ?4, \
        updated_at = ?5 WHERE id = ?6",
        (
            expense.amount.to_string(),
            expense.category.as_ref(),
            expense.date.unix_timestamp(),
            &expense.description,
            expense.updated_at.unix_timestamp(),
            expense_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(expense)
}

/// Delete an expense by ID and return the deleted expense.
///
/// # Errors
/// Returns [Error::NotFound] if there is no expense with the ID.
pub fn delete_expense(expense_id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = get_expense(expense_id, connection)?;

    let rows_affected = connection.execute("DELETE FROM expense WHERE id = ?1", [expense_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(expense)
}

/// Create a LIKE pattern that matches `text` anywhere in a column.
fn contains_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let raw_category: String = row.get(2)?;

    Ok(Expense {
        id: row.get(0)?,
        amount: decimal_from_column(row, 1)?,
        category: Category::new_unchecked(&raw_category),
        date: timestamp_from_column(row, 3)?,
        description: row.get(4)?,
        created_at: timestamp_from_column(row, 5)?,
        updated_at: timestamp_from_column(row, 6)?,
    })
}
